use std::sync::Arc;

use super::engine_metrics::EngineMetrics;

pub fn render_prometheus(m: &Arc<EngineMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "responder_engine_incidents_ingested_total", m.incidents_ingested_val());
    write_counter(&mut out, "responder_engine_deliveries_suppressed_total", m.deliveries_suppressed_val());
    write_counter(&mut out, "responder_engine_resolved_dropped_total", m.resolved_dropped_val());
    write_counter(&mut out, "responder_engine_validation_failures_total", m.validation_failures_val());
    write_counter(&mut out, "responder_engine_workflows_started_total", m.workflows_started_val());
    write_counter(&mut out, "responder_engine_workflows_resolved_total", m.workflows_resolved_val());
    write_counter(&mut out, "responder_engine_workflows_failed_total", m.workflows_failed_val());
    write_counter(&mut out, "responder_engine_workflows_escalated_total", m.workflows_escalated_val());
    write_counter(&mut out, "responder_engine_actions_attempted_total", m.actions_attempted_val());
    write_counter(&mut out, "responder_engine_actions_failed_total", m.actions_failed_val());
    write_counter(&mut out, "responder_engine_deliveries_dead_lettered_total", m.deliveries_dead_lettered_val());
    write_counter(&mut out, "responder_engine_dead_letters_replayed_total", m.dead_letters_replayed_val());
    write_counter(&mut out, "responder_engine_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "responder_engine_notifications_failed_total", m.notifications_failed_val());

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}
