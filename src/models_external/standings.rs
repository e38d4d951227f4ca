use serde::{Deserialize, Serialize};

use super::matches::ExtTeam;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtStandingRow {
    pub position: u8,
    pub team: ExtTeam,
    pub playedGames: u16,
    pub won: u16,
    pub draw: u16,
    pub lost: u16,
    pub points: u16,
    pub goalsFor: u16,
    pub goalsAgainst: u16,
    pub goalDifference: i16,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtStandingTable {
    #[serde(rename = "type")]
    pub table_type: String,
    pub table: Vec<ExtStandingRow>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StandingsRsp {
    pub standings: Vec<ExtStandingTable>,
}

impl StandingsRsp {
    pub fn get_total(&self) -> Option<&Vec<ExtStandingRow>> {
        self.standings.iter()
            .find(|e| e.table_type == "TOTAL")
            .or_else(|| self.standings.first())
            .map(|e| &e.table)
    }
}
