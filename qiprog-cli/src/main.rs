// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A thin exerciser for the QiProg host library: attaches a loopback
//! transport wrapping a RAM-backed demo chip and runs one operation
//! against it per invocation. Useful for poking at the protocol stack
//! without real programmer hardware, which this workspace does not
//! drive (spec §1).

mod sim_chip;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use log::info;

use qiprog_host::{Context, DeviceIdentity, LoopbackTransport, ScanConfig};
use qiprog_proto::capabilities::BusKind;

use sim_chip::SimChip;

/// Endpoint max-packet size used by the simulated device descriptor.
const SIM_MAX_PACKET: usize = 64;

#[derive(Debug, Parser)]
#[clap(about = "exerciser for the QiProg flash-programmer protocol stack")]
enum Cmd {
    /// Print the programmer's capability record.
    Capabilities,
    /// Select which bus the following operations address.
    SetBus {
        /// One of: lpc, isa, fwh, spi, bdm17, bdm35, aud.
        bus: String,
    },
    /// Request a bus clock in kHz; prints the clock actually granted.
    SetClock { khz: u32 },
    /// Read up to nine chip-ID records off the attached chip(s).
    ReadChipId,
    /// Declare the active chip-address window.
    SetAddress { start: String, end: String },
    Read8 { addr: String },
    Read16 { addr: String },
    Read32 { addr: String },
    Write8 { addr: String, val: u8 },
    Write16 { addr: String, val: u16 },
    Write32 { addr: String, val: u32 },
    /// Bulk-read `len` bytes starting at `addr`, printed as hex.
    Read { addr: String, len: usize },
    /// Bulk-write hex-encoded `data` starting at `addr`.
    Write { addr: String, data: String },
}

fn parse_addr(s: &str) -> Result<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u32::from_str_radix(digits, 16).with_context(|| format!("'{s}' is not a valid hex address"))
}

fn parse_bus(s: &str) -> Result<BusKind> {
    let bus = match s.to_ascii_lowercase().as_str() {
        "lpc" => BusKind::LPC,
        "isa" => BusKind::ISA,
        "fwh" => BusKind::FWH,
        "spi" => BusKind::SPI,
        "bdm17" => BusKind::BDM17,
        "bdm35" => BusKind::BDM35,
        "aud" => BusKind::AUD,
        other => bail!("unknown bus kind '{other}'"),
    };
    Ok(bus)
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        bail!("hex data must have an even number of digits");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).with_context(|| format!("invalid hex byte at offset {i}")))
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cmd = Cmd::parse();

    let mut ctx = Context::init(ScanConfig::default());
    let id = ctx.attach(
        Box::new(LoopbackTransport::new(SimChip::new(), SIM_MAX_PACKET, SIM_MAX_PACKET)),
        DeviceIdentity::default(),
    );
    let device = ctx.open(id).context("failed to open simulated device")?;
    info!("attached simulated device, endpoint size {SIM_MAX_PACKET}");

    match cmd {
        Cmd::Capabilities => {
            let caps = device.get_capabilities()?;
            println!("instruction_set: {:?}", caps.instruction_set);
            println!("bus_master:      {:?}", caps.bus_master);
            println!("max_direct_data: {}", caps.max_direct_data);
            println!("voltages (mV):   {:?}", caps.voltages().collect::<Vec<_>>());
        }
        Cmd::SetBus { bus } => {
            device.set_bus(parse_bus(&bus)?)?;
            println!("bus set to {bus}");
        }
        Cmd::SetClock { khz } => {
            let actual = device.set_clock(khz)?;
            println!("clock granted: {actual} kHz");
        }
        Cmd::ReadChipId => {
            let ids = device.read_chip_id()?;
            for rec in ids.as_slice() {
                println!("{:?} vendor={:#06x} device={:#010x}", rec.id_method, rec.vendor_id, rec.device_id);
            }
        }
        Cmd::SetAddress { start, end } => {
            device.set_address(parse_addr(&start)?, parse_addr(&end)?)?;
            println!("address window set");
        }
        Cmd::Read8 { addr } => println!("{:#04x}", device.read8(parse_addr(&addr)?)?),
        Cmd::Read16 { addr } => println!("{:#06x}", device.read16(parse_addr(&addr)?)?),
        Cmd::Read32 { addr } => println!("{:#010x}", device.read32(parse_addr(&addr)?)?),
        Cmd::Write8 { addr, val } => device.write8(parse_addr(&addr)?, val)?,
        Cmd::Write16 { addr, val } => device.write16(parse_addr(&addr)?, val)?,
        Cmd::Write32 { addr, val } => device.write32(parse_addr(&addr)?, val)?,
        Cmd::Read { addr, len } => {
            let mut buf = vec![0u8; len];
            device.read(parse_addr(&addr)?, &mut buf)?;
            println!("{}", buf.iter().map(|b| format!("{b:02x}")).collect::<String>());
        }
        Cmd::Write { addr, data } => {
            let bytes = parse_hex_bytes(&data)?;
            device.write(parse_addr(&addr)?, &bytes)?;
            println!("wrote {} bytes", bytes.len());
        }
    }

    Ok(())
}
