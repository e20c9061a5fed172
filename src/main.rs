use anyhow::{bail, Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use ssm2_lib::dtc::{read_set_dtcs, read_stored_dtcs};
use ssm2_lib::parameters::{self, DerivedParameter, Parameter};
use ssm2_lib::{logging_session, Connection};
use std::{ops::Deref, panic};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

mod commandline;

use commandline::{CliArgs, CliCommands};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

fn print_catalogue() {
    for p in parameters::PARAMETERS {
        println!(
            "{:<6} {:<60} {:>8}  0x{:02X}{:02X}{:02X} ({} byte{})",
            p.id,
            p.name,
            p.unit.to_string(),
            p.address.address[0],
            p.address.address[1],
            p.address.address[2],
            p.address.length,
            if p.address.length == 1 { "" } else { "s" },
        );
    }
    for d in parameters::DERIVED_PARAMETERS {
        println!(
            "{:<6} {:<60} {:>8}  derived from {}",
            d.id,
            d.name,
            d.unit.to_string(),
            d.depends_on.join(", "),
        );
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits the requested ids into primitives and derived parameters,
/// validating each against what the ECU supports. Derived parameters whose
/// dependencies aren't part of the selection are skipped with a warning
/// since their inputs would never be read.
fn select_parameters(
    ecu: &ssm2_lib::Ecu,
    requested: &[String],
) -> Result<(Vec<&'static Parameter>, Vec<&'static DerivedParameter>)> {
    if requested.is_empty() {
        return Ok((
            ecu.supported_parameters.clone(),
            ecu.supported_derived_parameters.clone(),
        ));
    }

    let mut primitives = Vec::new();
    let mut derived = Vec::new();
    for id in requested {
        if let Some(p) = ecu.supported_parameters.iter().find(|p| p.id == id.as_str()) {
            primitives.push(*p);
        } else if let Some(d) = ecu
            .supported_derived_parameters
            .iter()
            .find(|d| d.id == id.as_str())
        {
            derived.push(*d);
        } else if parameters::parameter(id).is_some() || parameters::derived_parameter(id).is_some()
        {
            bail!("parameter {id} is not supported by this ECU");
        } else {
            bail!("unknown parameter id {id}");
        }
    }
    derived.retain(|d| {
        let complete = d
            .depends_on
            .iter()
            .all(|dep| primitives.iter().any(|p| p.id == *dep));
        if !complete {
            warn!(
                "skipping {}: it needs {} logged as well",
                d.id,
                d.depends_on.join(", ")
            );
        }
        complete
    });
    Ok((primitives, derived))
}

/// Parses `id=symbol` pairs (e.g. `P9=mph`) into unit preferences.
fn parse_unit_preferences(pairs: &[String]) -> Result<std::collections::HashMap<&str, ssm2_lib::units::Unit>> {
    let mut preferences = std::collections::HashMap::new();
    for pair in pairs {
        let (id, symbol) = pair
            .split_once('=')
            .with_context(|| format!("expected id=unit, got '{pair}'"))?;
        let unit = ssm2_lib::units::Unit::from_symbol(symbol)
            .with_context(|| format!("unknown unit symbol '{symbol}'"))?;
        preferences.insert(id, unit);
    }
    Ok(preferences)
}

async fn run<S>(mut conn: Connection<S>, args: CliArgs) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    conn.transport_mut().set_read_timeout(args.timeout);
    conn.transport_mut().set_total_read_timeout(args.total_timeout);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
        });
    }

    match args.command {
        CliCommands::Params => unreachable!("handled before opening the device"),
        CliCommands::Init => {
            let ecu = conn
                .init_ecu(&cancel)
                .await
                .with_context(|| "Cannot initialize ECU")?;
            println!("SSM ID: {}", hex(&ecu.ssm_id));
            println!("ROM ID: {}", hex(&ecu.rom_id));
            println!("Supported parameters ({}):", ecu.supported_parameters.len());
            for p in &ecu.supported_parameters {
                println!("  {:<6} {}", p.id, p.name);
            }
            println!(
                "Supported derived parameters ({}):",
                ecu.supported_derived_parameters.len()
            );
            for d in &ecu.supported_derived_parameters {
                println!("  {:<6} {}", d.id, d.name);
            }
            conn.close().await?;
        }
        CliCommands::Dtcs => {
            let set = read_set_dtcs(&mut conn, &cancel)
                .await
                .with_context(|| "Cannot read set trouble codes")?;
            let stored = read_stored_dtcs(&mut conn, &cancel)
                .await
                .with_context(|| "Cannot read stored trouble codes")?;
            println!("Set trouble codes ({}):", set.len());
            for d in set {
                println!("  {}", d.name);
            }
            println!("Stored trouble codes ({}):", stored.len());
            for d in stored {
                println!("  {}", d.name);
            }
            conn.close().await?;
        }
        CliCommands::Log { params, units } => {
            let preferences = parse_unit_preferences(&units)?;
            let ecu = conn
                .init_ecu(&cancel)
                .await
                .with_context(|| "Cannot initialize ECU")?;
            let (primitives, derived) = select_parameters(&ecu, &params)?;
            if primitives.is_empty() {
                bail!("nothing to log");
            }
            info!(
                "logging {} parameters and {} derived parameters",
                primitives.len(),
                derived.len()
            );

            let ids: Vec<&str> = primitives
                .iter()
                .map(|p| p.id)
                .chain(derived.iter().map(|d| d.id))
                .collect();

            let mut session = logging_session(conn, primitives, derived, cancel.clone())
                .await
                .with_context(|| "Cannot start logging session")?;
            while let Some(mut values) = session.next_values().await {
                ssm2_lib::apply_unit_preferences(&mut values, &preferences);
                let row = ids
                    .iter()
                    .filter_map(|id| values.get(id).map(|v| format!("{id}={:.2}{}", v.value, v.unit)))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{} {row}", chrono::Local::now().format("%H:%M:%S%.3f"));
            }

            let conn = session.stop().await?;
            conn.close().await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    if args.command == CliCommands::Params {
        print_catalogue();
        return Ok(());
    }

    if args.fake {
        let stream = ssm2_lib::fake::fake_ecu(args.fake_latency);
        return run(Connection::new(stream), args).await;
    }

    use tokio_serial::SerialPortBuilderExt;
    let port = tokio_serial::new(&args.device, ssm2_lib::transport::BAUD_RATE)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .with_context(|| format!("Cannot open serial port '{}'", args.device))?;
    run(Connection::new(port), args).await
}
