use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub total_amount: i64,
    pub history: Vec<SettlementEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_class_count: i64,
    pub monthly_income: i64,
    pub new_requests_count: i64,
}
