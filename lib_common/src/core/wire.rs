//! Flat line format pushed to live consumers.
//!
//! `name=..|money=..|players=..|job_id=..|script=..|is_10m_plus=..`, fixed field
//! order. Values are written as-is: a `|` or `=` inside a name or script makes the
//! line ambiguous to split downstream.

use crate::model::ServerEvent;

pub fn to_wire_line(event: &ServerEvent) -> String {
    format!(
        "name={}|money={:?}|players={}|job_id={}|script={}|is_10m_plus={}",
        event.name.as_deref().unwrap_or_default(),
        event.money_rate.unwrap_or(0.0),
        event.players.as_deref().unwrap_or_default(),
        event.job_id.as_deref().unwrap_or_default(),
        event.script.as_deref().unwrap_or_default(),
        event.is_high_value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_and_rendering() {
        let event = ServerEvent {
            name: Some("Foo".into()),
            money_rate: Some(15.0),
            players: Some("3/8".into()),
            job_id: Some("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee".into()),
            script: Some("game:Teleport()".into()),
            is_high_value: true,
            ..Default::default()
        };
        assert_eq!(
            to_wire_line(&event),
            "name=Foo|money=15.0|players=3/8|job_id=aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee|script=game:Teleport()|is_10m_plus=true"
        );
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let line = to_wire_line(&ServerEvent::default());
        assert_eq!(line, "name=|money=0.0|players=|job_id=|script=|is_10m_plus=false");
    }

    #[test]
    fn test_fractional_money() {
        let event = ServerEvent {
            money_rate: Some(0.6),
            ..Default::default()
        };
        assert!(to_wire_line(&event).contains("|money=0.6|"));
    }
}
