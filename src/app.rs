//! Application tasks: the CDC line console and the boot-mode dispatcher.

use badge_usb::bindings::Bindings;
use badge_usb::config::CDC_EP_SIZE;
use badge_usb::console::{self, Feed, LineEditor};
use badge_usb::context::{BootAction, DeviceContext};
use badge_usb::fs_service::volume::RamVolume;
use badge_usb::fs_service::{take_startup_module, Session};
use badge_usb::relay::Relay;
use defmt::{info, warn};
use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Timer};
use embassy_usb::driver::EndpointError;

use crate::usb::composite::{Cdc, QueueSink};
use crate::usb::handler::{INTERRUPT, MODE_CHANGED};
use crate::usb::vendor::SharedPort;

const PACKET: usize = CDC_EP_SIZE as usize;
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Writes `data` in full packets, ending with a short (possibly empty) one.
async fn write_all(cdc: &mut Cdc, data: &[u8]) -> Result<(), EndpointError> {
    for chunk in data.chunks(PACKET) {
        cdc.write_packet(chunk).await?;
    }
    if data.len() % PACKET == 0 {
        cdc.write_packet(&[]).await?;
    }
    Ok(())
}

/// Line console on the CDC port.
#[embassy_executor::task]
pub async fn console_task(mut cdc: Cdc, ctx: &'static DeviceContext) -> ! {
    let mut bindings = Bindings::new(ctx, QueueSink, SharedPort);
    let mut editor = LineEditor::new();
    let mut buf = [0u8; PACKET];

    loop {
        cdc.wait_connection().await;
        info!("console connected");

        'session: loop {
            let n = match cdc.read_packet(&mut buf).await {
                Ok(n) => n,
                Err(_) => break 'session,
            };
            // Echo what was typed.
            if cdc.write_packet(&buf[..n]).await.is_err() {
                break 'session;
            }
            for &byte in &buf[..n] {
                let out = match editor.feed(byte) {
                    Feed::Pending => continue,
                    Feed::Line(line) => {
                        let mut reply = console::execute(&mut bindings, &line);
                        let _ = reply.push_str("\r\n");
                        reply
                    }
                    Feed::Interrupt => {
                        INTERRUPT.signal(());
                        let mut reply = console::Reply::new();
                        let _ = reply.push_str("\r\nKeyboardInterrupt\r\n");
                        reply
                    }
                };
                if write_all(&mut cdc, out.as_bytes()).await.is_err() {
                    break 'session;
                }
            }
        }

        warn!("console disconnected");
    }
}

async fn file_service(volume: &mut RamVolume) -> ! {
    let mut relay = Relay::new(SharedPort);
    let mut session = Session::new(volume);
    session.start(&mut relay);
    loop {
        if !session.poll(&mut relay) {
            Timer::after(IDLE_POLL).await;
        }
    }
}

async fn launch_app(volume: &mut RamVolume) -> ! {
    match take_startup_module(volume) {
        Some(module) => {
            info!("starting app {}", module.as_str());
            idle().await
        }
        None => {
            warn!("no startup module, running file service");
            file_service(volume).await
        }
    }
}

async fn idle() -> ! {
    loop {
        core::future::pending::<()>().await;
    }
}

async fn run(action: BootAction, volume: &mut RamVolume) -> ! {
    match action {
        BootAction::Console => idle().await,
        BootAction::FileService => file_service(volume).await,
        BootAction::LaunchApp => launch_app(volume).await,
    }
}

/// Runs the action selected by the personality mode, restarting it when
/// the host switches mode and dropping to the console on a break.
#[embassy_executor::task]
pub async fn boot_task(ctx: &'static DeviceContext, volume: &'static mut RamVolume) -> ! {
    let mut action = BootAction::from_mode(ctx.mode());
    loop {
        info!("boot action: {}", action);
        action = match select3(run(action, volume), MODE_CHANGED.wait(), INTERRUPT.wait()).await {
            Either3::First(never) => never,
            Either3::Second(mode) => BootAction::from_mode(mode),
            Either3::Third(()) => {
                warn!("interrupted by host");
                BootAction::Console
            }
        };
    }
}
