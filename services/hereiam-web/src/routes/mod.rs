pub mod auth;
pub mod common;
pub mod health;
pub mod pages;
pub mod tiles;
pub mod ui;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(pages::index)
        .service(pages::mission)
        .service(pages::auth_about)
        .service(pages::leave)
        .service(auth::auth_form)
        .service(auth::login)
        .service(auth::register)
        .service(ui::toggle_drawer)
        .service(ui::toggle_theme)
        .service(ui::map_snapshot)
        .service(ui::select_layer)
        .service(ui::rerender)
        .service(ui::draw)
        .service(ui::report_location)
        .service(ui::create_mission)
        .service(tiles::tile);
}
