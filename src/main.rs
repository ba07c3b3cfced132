use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use step_adapters::{FormStep, GateOptions, HumanGateStep, TaskOptions, TaskOutcome, TaskStep, INPUT_REQUESTED};
use step_core::{EventRecorder, OptionsSchema, Step, StepEventData, StepEventName};
use stepflow::config::AppConfig;
use stepflow::errors::AppError;

/// Resumen final de cada step, impreso como JSON.
#[derive(Debug, Serialize)]
struct StepSummary {
    id: String,
    kind: String,
    status: u16,
    phase: String,
    options_fingerprint: Option<String>,
}

impl StepSummary {
    fn of(step: &dyn Step) -> Self {
        Self { id: step.id().to_string(),
               kind: step.kind().to_string(),
               status: step.status().value(),
               phase: step.get_status().to_string(),
               options_fingerprint: step.options_fingerprint() }
    }
}

fn log_event(data: &StepEventData<'_>) {
    match data.reason {
        Some(reason) => info!("[{}] {}: {} -> {} ({reason})",
                              data.step.id(),
                              data.event,
                              data.previous_status,
                              data.status),
        None => info!("[{}] {}: {} -> {}", data.step.id(), data.event, data.previous_status, data.status),
    }
}

fn watch(step: &mut dyn Step, recorder: &EventRecorder) {
    recorder.attach(step);
    recorder.attach_to(step, StepEventName::custom(INPUT_REQUESTED));
    step.on(StepEventName::StatusChange, Box::new(log_event));
    step.on(StepEventName::custom(INPUT_REQUESTED), Box::new(log_event));
}

fn main() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    env_logger::Builder::new().filter_level(cfg.log_level).init();
    let recorder = EventRecorder::new();

    // 1) step automatizado sobre los ítems configurados
    let mut task = TaskStep::new("ingest", |item| {
        info!("processing '{item}'");
        TaskOutcome::Completed
    });
    watch(&mut task, &recorder);
    task.configure(&TaskOptions::new(cfg.demo.items.iter().cloned()))?;
    task.run();

    // 2) formulario: primero bloquea, luego recibe la entrega
    let schema = OptionsSchema::from_value(json!({
        "title": "Release notes",
        "type": "object",
        "properties": {
            "summary": { "type": "string", "minLength": 1 },
            "version": { "type": "string" }
        },
        "required": ["summary", "version"]
    }));
    let mut form = FormStep::new("notes", schema);
    watch(&mut form, &recorder);
    form.run();
    if let Err(err) = form.set_options(json!({ "summary": "" })) {
        warn!("submission rejected: {err}");
    }
    form.set_options(json!({ "summary": "first release", "version": "0.1.0" }))?;
    form.run();

    // 3) compuerta humana
    let mut gate = HumanGateStep::new("release-approval");
    watch(&mut gate, &recorder);
    gate.configure(&GateOptions::new("Publish release 0.1.0?").with_approvers([cfg.demo.approver.clone()]))?;
    gate.run();
    if cfg.demo.auto_approve {
        gate.approve(&cfg.demo.approver)?;
    } else {
        info!("gate '{}' left awaiting approval", gate.id());
    }

    let summary: Vec<StepSummary> = [&task as &dyn Step, &form, &gate].into_iter().map(StepSummary::of).collect();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("{} event(s) recorded", recorder.len());
    Ok(())
}
