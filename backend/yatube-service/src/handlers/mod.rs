/// HTTP handlers and routing
use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

use crate::metrics::serve_metrics;
use crate::urls;

pub mod auth;
pub mod comments;
pub mod follows;
pub mod health;
pub mod posts;

/// `?page=` as given; resolution happens in the paginator
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Register every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics))
        .route("/health", web::get().to(health::health_summary))
        .route("/health/ready", web::get().to(health::readiness_summary))
        .route("/health/live", web::get().to(health::liveness_check))
        .route(urls::INDEX, web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .route("/profile/{username}/follow/", web::get().to(follows::profile_follow))
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(follows::profile_unfollow),
        )
        .route(urls::FOLLOW_INDEX, web::get().to(follows::follow_index))
        .service(
            web::resource(urls::POST_CREATE)
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .route("/posts/{post_id}/delete/", web::post().to(posts::post_delete))
        .route("/posts/{post_id}/comment/", web::post().to(comments::add_comment))
        .route(urls::SIGNUP, web::post().to(auth::signup))
        .service(
            web::resource(urls::LOGIN)
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        );
}
