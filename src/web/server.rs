// ============================================================
// Web — HTTP Server
// ============================================================
// actix-web frontend over a PricePredictor:
//
//   GET  /             → landing page
//   GET  /predictdata  → empty form
//   POST /predictdata  → parse the 10 fields, predict, re-render
//
// A field that is not a finite number re-renders the form with
// the error inline and status 200. Any other failure renders
// the form with a service error and status 500.
//
// The predictor is built once before the server starts and
// shared by every worker as web::Data (an Arc) without locks.

use std::{collections::HashMap, sync::Arc};

use actix_web::{http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};

use crate::application::predict_use_case::format_price;
use crate::domain::error::PipelineError;
use crate::domain::house::HouseFeatures;
use crate::domain::traits::PricePredictor;
use crate::web::pages;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeConfig {
    pub host:      String,
    pub port:      u16,
    pub model_dir: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host:      "0.0.0.0".to_string(),
            port:      5000,
            model_dir: "models".to_string(),
        }
    }
}

/// Register the frontend routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .service(
            web::resource("/predictdata")
                .route(web::get().to(predict_form))
                .route(web::post().to(predict_datapoint)),
        );
}

/// Serve until the process is stopped.
pub async fn run(config: ServeConfig, predictor: Arc<dyn PricePredictor>) -> std::io::Result<()> {
    let data = web::Data::from(predictor);

    tracing::info!("Listening on http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

async fn index() -> HttpResponse {
    html(StatusCode::OK, pages::landing_page())
}

async fn predict_form() -> HttpResponse {
    html(StatusCode::OK, pages::form_page(None, None))
}

async fn predict_datapoint(
    predictor: web::Data<dyn PricePredictor>,
    form:      web::Form<HashMap<String, String>>,
) -> HttpResponse {
    let form = form.into_inner();

    let outcome = HouseFeatures::from_form(&form).and_then(|house| predictor.predict(&house));
    match outcome {
        Ok(price) => {
            let shown = format_price(price);
            tracing::info!("Predicted price {}", shown);
            html(StatusCode::OK, pages::form_page(Some(&form), Some(&shown)))
        }
        Err(e) if e.is_validation() => {
            tracing::warn!("Rejected form input: {}", e);
            html(StatusCode::OK, pages::form_page(Some(&form), Some(&invalid_input_message(&e))))
        }
        Err(e) => {
            tracing::error!("Prediction failed: {}", e);
            let message = format!("Error: the prediction service failed. Detail: {e}");
            html(StatusCode::INTERNAL_SERVER_ERROR, pages::form_page(Some(&form), Some(&message)))
        }
    }
}

fn invalid_input_message(e: &PipelineError) -> String {
    let detail = match e {
        PipelineError::Validation { field, detail } => format!("{field}: {detail}"),
        other => other.to_string(),
    };
    format!("Error: Invalid input format. Please ensure all fields are numbers. Detail: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineResult;
    use crate::domain::schema::FeatureSchema;
    use actix_web::test;

    enum Stub {
        Price(f64),
        Broken,
    }

    impl PricePredictor for Stub {
        fn predict(&self, _: &HouseFeatures) -> PipelineResult<f64> {
            match self {
                Stub::Price(p) => Ok(*p),
                Stub::Broken   => Err(PipelineError::Prediction("model returned NaN".to_string())),
            }
        }
    }

    fn sample_form() -> Vec<(String, String)> {
        FeatureSchema::ames()
            .form_names()
            .into_iter()
            .zip(HouseFeatures::sample().values())
            .map(|(name, v)| (name.to_string(), v.to_string()))
            .collect()
    }

    async fn post(stub: Stub, form: &[(String, String)]) -> (StatusCode, String) {
        let predictor: Arc<dyn PricePredictor> = Arc::new(stub);
        let app = test::init_service(
            App::new().app_data(web::Data::from(predictor)).configure(routes),
        )
        .await;
        let req  = test::TestRequest::post().uri("/predictdata").set_form(form).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body   = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn test_get_pages() {
        let predictor: Arc<dyn PricePredictor> = Arc::new(Stub::Price(1.0));
        let app = test::init_service(
            App::new().app_data(web::Data::from(predictor)).configure(routes),
        )
        .await;

        for uri in ["/", "/predictdata"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        }
    }

    #[actix_web::test]
    async fn test_valid_form_shows_two_decimal_price() {
        let (status, body) = post(Stub::Price(181234.5678), &sample_form()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("181234.57"));
    }

    #[actix_web::test]
    async fn test_non_numeric_field_rerenders_form_with_error() {
        let mut form = sample_form();
        form[6].1 = "big".to_string();

        let (status, body) = post(Stub::Price(1.0), &form).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error: Invalid input format. Please ensure all fields are numbers."));
        assert!(body.contains("Lot_Area"));
        assert!(body.contains("name=\"Overall_Qual\""));
    }

    #[actix_web::test]
    async fn test_missing_field_is_a_validation_error() {
        let form: Vec<(String, String)> = sample_form().into_iter().skip(1).collect();
        let (status, body) = post(Stub::Price(1.0), &form).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Invalid input format"));
    }

    #[actix_web::test]
    async fn test_service_failure_is_500() {
        let (status, body) = post(Stub::Broken, &sample_form()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("prediction service failed"));
    }
}
