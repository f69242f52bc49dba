//! Binario de demostración: construye dos pipelines pequeños, los ejecuta con
//! las opciones de la configuración y muestra el reporte del último run.

use std::thread;
use std::time::Duration;

use chrono::{Datelike, Utc};
use log::info;
use pipeflow::config::{ReportFormat, CONFIG};
use pipeflow::errors::AppError;
use pipeflow::last_run::{run_recorded, LastRun};
use pipeflow::report::{render_json, render_text};
use pipeflow_core::{bindings, make, path, Deferred, Inspect, Path, Pipeline, Step, StepError, StepFn, Value};
use serde_json::json;

/// Búsqueda opaca de una persona por id.
fn find_person(id: &Value) -> Result<Value, StepError> {
    match id.try_i64()? {
        1 => Ok(json!({"name": "Ada", "birth_year": 1815}).into()),
        2 => Ok(json!({"name": "Grace", "birth_year": 1906}).into()),
        other => Err(StepError::new(format!("person {other} not found")).with_data(json!({"id": other}))),
    }
}

fn age_pipeline() -> Result<Pipeline, AppError> {
    let person_schema = json!({"type": "object", "required": ["name", "birth_year"]});
    let load = Step::action("load-person", StepFn::unary(find_person), ["person_id"]).with_output("person")
                                                                                   .with_schema(person_schema);

    let years = StepFn::binary(|born, year| Ok(Value::from(year.try_i64()? - born.try_i64()?)));
    let age = Step::transformation("compute-age", years, [path!["person", "birth_year"], Path::from("current_year")])
        .with_output("age")
        .with_schema(json!("integer"));

    let sentence = StepFn::binary(|name, age| {
        Ok(Value::from(format!("{} would be {} years old", name.try_str()?, age.try_i64()?)))
    });
    let greet = Step::transformation("greet", sentence, [path!["person", "name"], Path::from("age")])
        .with_output("greeting");

    Ok(make(bindings! { "current_year" => i64::from(Utc::now().year()) }, vec![load, age, greet])?)
}

fn lookup_rate(currency: &str) -> Result<Value, StepError> {
    thread::sleep(Duration::from_millis(50));
    match currency {
        "EUR" => Ok(Value::from(0.92)),
        "GBP" => Ok(Value::from(0.79)),
        other => Err(StepError::new(format!("no rate for {other}"))),
    }
}

/// Conversión de moneda con una cotización que llega de forma diferida.
fn conversion_pipeline() -> Result<Pipeline, AppError> {
    let fetch = StepFn::unary(|currency| {
        let currency = currency.try_str()?.to_string();
        Ok(Value::from(Deferred::spawn(move || lookup_rate(&currency))))
    });
    let quote = Step::action("fetch-rate", fetch, ["currency"]).with_output("rate");

    let multiply = StepFn::binary(|amount, rate| Ok(Value::from(amount.try_f64()? * rate.try_f64()?)));
    let convert = Step::transformation("convert", multiply, ["amount", "rate"]).with_output("converted")
                                                                            .with_schema(json!("number"));

    Ok(make(bindings! { "currency" => "EUR" }, vec![quote, convert])?)
}

fn print_report(pipeline: &Pipeline, format: ReportFormat) -> Result<(), AppError> {
    match format {
        ReportFormat::Text => print!("{}", render_text(pipeline)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(pipeline))?),
    }
    Ok(())
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(CONFIG.log_level.as_str())).init();

    let options = CONFIG.run_options();
    let last = LastRun::new();
    info!("configuración: async args={}, precedence={}, report={}",
          CONFIG.allow_async_args,
          CONFIG.precedence,
          CONFIG.report_format);

    let ages = age_pipeline()?;
    for id in [1, 3] {
        let done = run_recorded(&last, &ages, bindings! { "person_id" => id }, &options)?;
        print_report(&done, CONFIG.report_format)?;
    }

    // La conversión necesita esperar la cotización.
    let conversion = conversion_pipeline()?;
    let done = run_recorded(&last,
                            &conversion,
                            bindings! { "amount" => 120.0 },
                            &options.clone().with_async_args(true))?;
    print_report(&done, CONFIG.report_format)?;

    if let Some(previous) = last.take() {
        info!("último run: {} ({})", previous.status(), previous.trace_fingerprint());
    }
    Ok(())
}
