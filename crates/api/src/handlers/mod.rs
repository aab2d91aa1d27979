pub mod catalog;
pub mod essay;
pub mod quiz;
pub mod stats;

pub async fn health() -> &'static str {
    "OK"
}
