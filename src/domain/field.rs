// Field records - thermography, field anomalies and protection relays
use serde::Serialize;

use super::equipment::Status;
use super::row::{Row, number_field, text_field};

pub const HOT_SPOT_C: f64 = 70.0;
pub const HEAT_ALERT_C: f64 = 55.0;
pub const HEAT_CRITICAL_C: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatReading {
    pub se: String,
    pub equipamento: String,
    pub temperatura: f64,
}

impl HeatReading {
    pub fn from_row(row: &Row) -> Self {
        Self {
            se: text_field(row, &["se", "subestacao"], ""),
            equipamento: text_field(row, &["equipamento"], ""),
            temperatura: number_field(row, &["temperatura"]),
        }
    }

    pub fn severity(&self) -> Status {
        if self.temperatura >= HEAT_CRITICAL_C {
            Status::Critico
        } else if self.temperatura >= HEAT_ALERT_C {
            Status::Alerta
        } else {
            Status::Normal
        }
    }

    pub fn is_hot(&self) -> bool {
        self.temperatura > HOT_SPOT_C
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Priorities are typed freely in the sheet ("Alta", "média - 30d", ...)
    pub fn parse(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("alta") {
            Priority::High
        } else if lower.contains("média") || lower.contains("media") {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgeBand {
    Recent,
    Aging,
    Overdue,
}

impl AgeBand {
    pub fn from_days(days: f64) -> Self {
        if days > 30.0 {
            AgeBand::Overdue
        } else if days > 15.0 {
            AgeBand::Aging
        } else {
            AgeBand::Recent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnomaly {
    pub data: String,
    pub os: String,
    pub se_area: String,
    pub circuito_parque: String,
    pub equipamento: String,
    pub anomalia: String,
    pub dias_corridos: f64,
    pub prioridade: String,
    pub status: String,
    pub nota: String,
}

impl FieldAnomaly {
    pub fn from_row(row: &Row) -> Self {
        Self {
            data: text_field(row, &["data"], ""),
            os: text_field(row, &["os"], ""),
            se_area: text_field(row, &["seArea", "searea"], ""),
            circuito_parque: text_field(row, &["circuitoParque", "circuitoparque"], ""),
            equipamento: text_field(row, &["equipamento"], ""),
            anomalia: text_field(row, &["anomalia"], ""),
            dias_corridos: number_field(row, &["diasCorridos", "diascorridos"]),
            prioridade: text_field(row, &["prioridade"], ""),
            status: text_field(row, &["status"], ""),
            nota: text_field(row, &["nota"], ""),
        }
    }

    pub fn priority(&self) -> Priority {
        Priority::parse(&self.prioridade)
    }

    pub fn age(&self) -> AgeBand {
        AgeBand::from_days(self.dias_corridos)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionUnit {
    pub parque: String,
    pub unit: String,
    pub sn_painel: String,
    pub painel: String,
    pub sn_rele: String,
    pub sn_modulo: String,
    pub status_comunica: String,
    pub status_protecao: String,
}

impl ProtectionUnit {
    pub fn from_row(row: &Row) -> Self {
        Self {
            parque: text_field(row, &["parque"], ""),
            unit: text_field(row, &["unit"], ""),
            sn_painel: text_field(row, &["snPainel", "snpainel"], ""),
            painel: text_field(row, &["painel"], ""),
            sn_rele: text_field(row, &["snRele", "snrele"], ""),
            sn_modulo: text_field(row, &["snModulo", "snmodulo"], ""),
            status_comunica: text_field(row, &["statusComunica", "statuscomunica"], ""),
            status_protecao: text_field(row, &["statusProtecao", "statusprotecao"], ""),
        }
    }

    pub fn communication_active(&self) -> bool {
        self.status_comunica == "Ativo"
    }

    pub fn protection_normal(&self) -> bool {
        self.status_protecao == "Normal"
    }
}

/// Record views with their derived flags, as served to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatView {
    #[serde(flatten)]
    pub reading: HeatReading,
    pub severity: Status,
    pub hot: bool,
}

impl From<HeatReading> for HeatView {
    fn from(reading: HeatReading) -> Self {
        Self {
            severity: reading.severity(),
            hot: reading.is_hot(),
            reading,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyView {
    #[serde(flatten)]
    pub anomaly: FieldAnomaly,
    pub priority_level: Priority,
    pub age: AgeBand,
}

impl From<FieldAnomaly> for AnomalyView {
    fn from(anomaly: FieldAnomaly) -> Self {
        Self {
            priority_level: anomaly.priority(),
            age: anomaly.age(),
            anomaly,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionView {
    #[serde(flatten)]
    pub unit: ProtectionUnit,
    pub communication_active: bool,
    pub protection_normal: bool,
}

impl From<ProtectionUnit> for ProtectionView {
    fn from(unit: ProtectionUnit) -> Self {
        Self {
            communication_active: unit.communication_active(),
            protection_normal: unit.protection_normal(),
            unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_heat_severity_tiers() {
        let heat = |t: f64| HeatReading::from_row(&row(json!({ "temperatura": t })));
        assert_eq!(heat(40.0).severity(), Status::Normal);
        assert_eq!(heat(55.0).severity(), Status::Alerta);
        assert_eq!(heat(75.0).severity(), Status::Critico);
        assert!(!heat(70.0).is_hot());
        assert!(heat(70.5).is_hot());
    }

    #[test]
    fn test_heat_from_loose_row() {
        let heat = HeatReading::from_row(&row(json!({ "se": "SE-01", "equipamento": "Chave 3", "temperatura": "81.2" })));
        assert_eq!(heat.se, "SE-01");
        assert_eq!(heat.temperatura, 81.2);
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!(Priority::parse("ALTA"), Priority::High);
        assert_eq!(Priority::parse("Média"), Priority::Medium);
        assert_eq!(Priority::parse("media"), Priority::Medium);
        assert_eq!(Priority::parse("baixa"), Priority::Low);
        assert_eq!(Priority::parse(""), Priority::Low);
    }

    #[test]
    fn test_anomaly_age_band() {
        let anomaly = FieldAnomaly::from_row(&row(json!({ "os": 1234, "diasCorridos": "31" })));
        assert_eq!(anomaly.os, "1234");
        assert_eq!(anomaly.age(), AgeBand::Overdue);
        assert_eq!(AgeBand::from_days(16.0), AgeBand::Aging);
        assert_eq!(AgeBand::from_days(15.0), AgeBand::Recent);
    }

    #[test]
    fn test_protection_flags() {
        let unit = ProtectionUnit::from_row(&row(json!({
            "parque": "P1", "statusComunica": "Ativo", "statusProtecao": "Bloqueado"
        })));
        assert!(unit.communication_active());
        assert!(!unit.protection_normal());
    }

    #[test]
    fn test_views_flatten_records() {
        let view = HeatView::from(HeatReading::from_row(&row(json!({ "se": "SE", "temperatura": 90 }))));
        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["se"], json!("SE"));
        assert_eq!(value["severity"], json!("Crítico"));
        assert_eq!(value["hot"], json!(true));
    }
}
