//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART0 in production). Each line starts with a
//! fixed tag so a serial capture can be grepped per event kind.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::devices::{Pump, Valve};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let a = &t.actuators;
                info!(
                    "TELEM | case={} hood={} | tank=0b{:05b} | EV={} | \
                     PE={:.0}mA PV={:.0}mA{} PD={} PP={} | img={:02X?} | errors={} | up={}s",
                    t.case,
                    if t.hood_on { "ON" } else { "OFF" },
                    t.tank.bits(),
                    valve_mask(&a.valves_open),
                    a.pumps_ma[Pump::Pe.index()],
                    a.pumps_ma[Pump::Pv.index()],
                    if a.pv_water { "(water)" } else { "" },
                    on_off(a.pumps_on[Pump::Pd.index()]),
                    on_off(a.pumps_on[Pump::Pp.index()]),
                    a.output_image,
                    t.error_total,
                    t.uptime_ms / 1000,
                );
            }
            AppEvent::CaseChanged { from, to } => {
                info!("CASE | {} -> {}", from, to);
            }
            AppEvent::CaseRejected { target, tank } => {
                warn!("REJECT | {} incompatible with tank=0b{:05b}", target, tank.bits());
            }
            AppEvent::SettleTimeout { target } => {
                warn!("SETTLE | valves still moving, {} aborted", target);
            }
            AppEvent::AuxChanged(on) => {
                info!("HOOD | {}", on_off(*on));
            }
            AppEvent::AutoReset { from, idle_ms } => {
                info!("AUTORESET | {} idle for {}s", from, idle_ms / 1000);
            }
            AppEvent::Fault(report) => {
                info!(
                    "FAULT | code=0x{:04X} {:?}/{:?} at {}ms",
                    report.code, report.severity, report.category, report.timestamp_ms
                );
            }
            AppEvent::Started(case) => {
                info!("START | initial_case={}", case);
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Open valves as letters, `-` for closed: `A-C---`.
fn valve_mask(open: &[bool; 6]) -> heapless::String<6> {
    let mut s = heapless::String::new();
    for valve in Valve::ALL {
        let c = if open[valve.index()] {
            (b'A' + valve.index() as u8) as char
        } else {
            '-'
        };
        // Six slots for six valves.
        let _ = s.push(c);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valve_mask_letters() {
        let open = [true, false, true, false, false, true];
        assert_eq!(valve_mask(&open).as_str(), "A-C--F");
    }
}
