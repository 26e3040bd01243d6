use actix_web::{http::StatusCode, test::TestRequest};

mod cart;
mod checkout;
mod helpers;
mod notifications;

#[actix_web::test]
async fn health() {
    let _ = env_logger::try_init().ok();
    let (status, body) = helpers::send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(crate::routes::health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
