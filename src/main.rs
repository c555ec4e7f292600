extern crate env_logger;
extern crate pulseaudio_glib as pulseaudio;

use pulseaudio::callback::SubscriptionEvent;
use pulseaudio::{PaContext, PaContextFlags, PaContextState, PaGlibMainLoop};
use std::cell::Cell;
use std::rc::Rc;

fn print_devices(ctx: &PaContext<PaGlibMainLoop>) {
    let issued = ctx.get_server_info(|result| match result {
        Ok(info) => {
            println!(
                "Server {} {} on {}",
                info.server_name.unwrap_or_default(),
                info.server_version.unwrap_or_default(),
                info.host_name.unwrap_or_default()
            );
            println!("Default sink: {}", info.default_sink_name.unwrap_or_default());
        }
        Err(e) => eprintln!("Failed to get server info: {}", e),
    });
    if let Err(e) = issued {
        eprintln!("Failed to request server info: {}", e);
    }

    let issued = ctx.get_sink_info_list(|result| match result {
        Ok(sinks) => {
            for sink in sinks {
                println!("Sink {}: {} [{}]", sink.index, sink.description.unwrap_or_default(), sink.volume);
            }
        }
        Err(e) => eprintln!("Failed to list sinks: {}", e),
    });
    if let Err(e) = issued {
        eprintln!("Failed to request sinks: {}", e);
    }
}

fn xmain() -> i32 {
    env_logger::init();

    let server = std::env::args().nth(1);
    let mainloop = match PaGlibMainLoop::new() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };
    let ctx = match PaContext::new(&mainloop, "RustPulseaudioTest") {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    ctx.subscribe(|_, event: SubscriptionEvent, index| {
        println!("Event: {:?} {:?} #{}", event.kind, event.facility, index);
    });

    let exit_code = Rc::new(Cell::new(None));
    let result = {
        let exit_code = exit_code.clone();
        ctx.connect(server.as_deref(), PaContextFlags::default(), move |ctx, state| {
            eprintln!("New state: {:?}", state);
            let err = ctx.errno();
            if err != 0 {
                eprintln!("Last error: {}: {}", err, pulseaudio::error::strerror(err));
            }
            match state {
                PaContextState::Ready => print_devices(ctx),
                PaContextState::Failed => exit_code.set(Some(1)),
                PaContextState::Terminated => exit_code.set(Some(0)),
                _ => (),
            }
        })
    };
    if let Err(e) = result {
        eprintln!("Failed to connect: {}", e);
        return 1;
    }

    mainloop.run_until(|| exit_code.get().is_some());
    let v = exit_code.get().unwrap_or(1);
    eprintln!("Stopped with return value {}", v);
    v
}

fn main() {
    let exit_code = xmain();
    std::process::exit(exit_code);
}
