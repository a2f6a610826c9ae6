use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Standing {
    pub rank: u32,
    pub player_id: Uuid,
    pub display_name: String,
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryColumn {
    pub player_id: Uuid,
    pub display_name: String,
}

/// One point in time. `values` lines up with the table's columns; `None`
/// means the player did not take part.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryRow {
    pub label: String,
    pub challenge_id: Option<Uuid>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryTable {
    pub columns: Vec<HistoryColumn>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StandingsQuery {
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

impl HistoryQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit
            && !(1..=50).contains(&limit)
        {
            return Err("limit must be between 1 and 50".to_string());
        }
        Ok(())
    }
}
