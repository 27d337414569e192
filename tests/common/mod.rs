use std::sync::Arc;
use training_sheets::test_utils::fixtures::training_sheet;
use training_sheets::test_utils::http::TestApp;
use training_sheets::test_utils::sheets::InMemorySession;

pub const TRAINING_SHEET_ID: &str = "crew-training";

/// An app authenticated against an in-memory backend holding one training sheet.
pub async fn app_with_training_sheet() -> (TestApp, Arc<InMemorySession>) {
    let session = Arc::new(InMemorySession::new().with_sheet(TRAINING_SHEET_ID, training_sheet()));
    let app = TestApp::with_session(session.clone()).await;
    (app, session)
}
