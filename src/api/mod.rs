pub mod handlers;
pub mod routes;

use serde::Serialize;

use crate::tts::language::AccentVoice;

#[derive(Debug, Serialize)]
pub struct AccentsResponse {
    pub accents: &'static [AccentVoice],
}
