use axum::Router;

pub async fn create_test_app() -> Router {
    learnpath_backend_rust::create_app().await
}
