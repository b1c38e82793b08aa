//! Persisted zoom and scroll of a roll

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollError};
use crate::geometry::{MAX_ROW_HEIGHT, MIN_ROW_HEIGHT};

/// Flat view state, stored beside the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollViewState {
    pub bar_width: f32,
    pub row_height: i32,
    pub start_bar: f32,
    pub end_bar: f32,
    pub viewport_position_y: f32,
}

impl RollViewState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let state: RollViewState = serde_json::from_str(json)?;
        if !(MIN_ROW_HEIGHT..=MAX_ROW_HEIGHT).contains(&state.row_height) {
            return Err(RollError::InvalidRowHeight(state.row_height));
        }
        Ok(state)
    }
}
