// ============================================================
// Web — Frontend
// ============================================================
// A landing page and a prediction form served over HTTP.
// Handlers only parse the form and render HTML; the price
// comes from whatever PricePredictor the server was started
// with (the PredictPipeline in production, a stub in tests).

/// HTML rendering and escaping
pub mod pages;

/// actix-web routes and server startup
pub mod server;
