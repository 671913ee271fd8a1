// Route exports
pub mod matches;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(matches::health_check));
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure),
    );
}
