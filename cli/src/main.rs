mod cli;

use crate::cli::{Cli, SubCommands};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::warn;
use simplelog::*;
use sispm_usb::device::libusb::LibUsbOutlet;
use sispm_usb::error::ConnectError;
use sispm_usb::outlet::{DeviceInfo, Outlet, OutletDevice, OutletReport};
use sispm_usb::{find_device_by_serial, find_devices};

type Session = OutletDevice<LibUsbOutlet>;

fn main() -> Result<()> {
    let cli: Cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )])
    .context("Unable to initialise logging")?;

    if let SubCommands::List = cli.command {
        return list_devices(cli.json);
    }

    let mut device = select_device(cli.serial.as_deref())?;
    if cli.hold {
        device.set_auto_release(false);
    }

    let result = run_command(&mut device, &cli);

    if cli.hold {
        if let Err(error) = device.dispose() {
            warn!("Unable to release device: {}", error);
        }
    }
    result
}

fn run_command(device: &mut Session, cli: &Cli) -> Result<()> {
    match cli.command {
        SubCommands::List => list_devices(cli.json),
        SubCommands::Info => {
            let info = device.info().context("Unable to read device information")?;
            print_info(&info, cli.json)
        }
        SubCommands::Status { outlet } => {
            let report = device.status(outlet).context("Unable to read outlet status")?;
            print_report(outlet, &report, cli.json, ("on", "off"))
        }
        SubCommands::On { outlet } => {
            let report = device.on(outlet).context("Unable to switch outlet on")?;
            print_report(outlet, &report, cli.json, ("ok", "failed"))?;
            check_confirmed(outlet, &report)
        }
        SubCommands::Off { outlet } => {
            let report = device.off(outlet).context("Unable to switch outlet off")?;
            print_report(outlet, &report, cli.json, ("ok", "failed"))?;
            check_confirmed(outlet, &report)
        }
        SubCommands::Toggle { outlet } => {
            let report = device.toggle(outlet).context("Unable to toggle outlet")?;
            print_report(outlet, &report, cli.json, ("ok", "failed"))?;
            check_confirmed(outlet, &report)
        }
    }
}

fn select_device(serial: Option<&str>) -> Result<Session> {
    if let Some(serial) = serial {
        return find_device_by_serial(serial)?
            .ok_or_else(|| anyhow!("No outlet device with serial {} was found", serial));
    }

    let mut devices = find_devices()?.collect::<Result<Vec<_>, _>>()?;
    match devices.len() {
        0 => Err(ConnectError::DeviceNotFound.into()),
        1 => Ok(devices.remove(0)),
        _ => {
            for device in devices.iter_mut() {
                let serial = device.serial().unwrap_or_else(|_| String::from("??"));
                println!("{} - {}", serial, device);
            }
            Err(anyhow!(
                "Multiple outlet devices are connected, please specify which one to control"
            ))
        }
    }
}

fn list_devices(json: bool) -> Result<()> {
    let mut found = vec![];
    for device in find_devices()? {
        let mut device = device?;
        found.push(device.info().with_context(|| format!("Unable to query {}", device))?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No outlet devices are connected.");
    }
    for info in found {
        println!(
            "{} - {} on bus {}, address {}",
            info.serial, info.device_type, info.bus, info.address
        );
    }
    Ok(())
}

fn print_info(info: &DeviceInfo, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    let unknown = String::from("(unknown)");
    println!("Manufacturer: {}", info.manufacturer.as_ref().unwrap_or(&unknown));
    println!("Product:      {}", info.product.as_ref().unwrap_or(&unknown));
    println!("Vendor ID:    {}", info.vendor_id);
    println!("Product ID:   {}", info.product_id);
    println!("Serial:       {}", info.serial);
    println!("Device Type:  {}", info.device_type);
    println!(
        "Outlets:      {}",
        info.outlets
            .iter()
            .map(|outlet| outlet.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Bus:          {:03}", info.bus);
    println!("Address:      {:03}", info.address);
    Ok(())
}

fn print_report(
    outlet: Outlet,
    report: &OutletReport,
    json: bool,
    (positive, negative): (&str, &str),
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let describe = |result: bool| if result { positive } else { negative };
    match report {
        OutletReport::Single(result) => println!("Outlet {}: {}", outlet, describe(*result)),
        OutletReport::All(results) => {
            for (number, result) in results {
                println!("Outlet {}: {}", number, describe(*result));
            }
        }
    }
    Ok(())
}

fn check_confirmed(outlet: Outlet, report: &OutletReport) -> Result<()> {
    if !report.all_succeeded() {
        bail!("The device did not confirm the change on outlet {}", outlet);
    }
    Ok(())
}
