//! Voltage Modbus Tunnel Demo
//!
//! Reads the observation block of a sensor node behind the gateway and
//! prints temperature and humidity.
//!
//! Usage: TUNNEL_KEY=<key> cargo run --bin demo <host> [port] [unit_id]
//! Example: TUNNEL_KEY=access-key cargo run --bin demo 192.168.0.20 9900 3

use std::env;
use std::process;

use voltage_modbus_tunnel::device::{observation_status, read_observation};
use voltage_modbus_tunnel::{ConnectionConfig, TunnelClient};

/// First register of the observation block
const OBSERVATION_ADDRESS: u16 = 203;
/// [temperature (2), status, humidity (2), status]
const OBSERVATION_REGISTERS: u16 = 6;
const TEMPERATURE: usize = 0;
const HUMIDITY: usize = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(host) = args.get(1) else {
        eprintln!("usage: {} <host> [port] [unit_id]", args[0]);
        process::exit(2);
    };
    let port: u16 = match args.get(2) {
        Some(port) => port.parse()?,
        None => voltage_modbus_tunnel::constants::DEFAULT_PORT,
    };
    let unit_id: u8 = match args.get(3) {
        Some(unit) => unit.parse()?,
        None => voltage_modbus_tunnel::constants::DEFAULT_UNIT_ID,
    };
    let key = env::var("TUNNEL_KEY").map_err(|_| "TUNNEL_KEY is not set")?;

    println!("{}", voltage_modbus_tunnel::info());
    println!("=============================");

    let config = ConnectionConfig::new(host)?.with_port(port)?;
    let mut client = TunnelClient::http(config, key);
    client.set_trace_hook(|frame, direction| {
        println!("  {} {}", direction, voltage_modbus_tunnel::trace::format_frame(frame));
    });

    println!(
        "Reading {} registers at {} from unit {} via {}",
        OBSERVATION_REGISTERS,
        OBSERVATION_ADDRESS,
        unit_id,
        client.config().authority()
    );

    match client
        .read_holding_registers(unit_id, OBSERVATION_ADDRESS, OBSERVATION_REGISTERS)
        .await
    {
        Ok(registers) => {
            println!("  registers: {:?}", registers);
            for (name, index) in [("temperature", TEMPERATURE), ("humidity", HUMIDITY)] {
                if let Some(value) = read_observation(&registers, index) {
                    let status = observation_status(&registers, index).unwrap_or_default();
                    println!("  {}: {:.2} (status {})", name, value, status);
                }
            }
        }
        Err(e) => {
            println!("  read failed: {}", e);
            println!("  last error: {}", client.last_error_text());
            if client.last_exception().is_some() {
                println!("  exception: {}", client.last_exception_details());
            }
        }
    }

    let stats = client.stats();
    println!(
        "\nrequests: {}, responses: {}, errors: {}",
        stats.requests_sent, stats.responses_received, stats.errors
    );
    Ok(())
}
