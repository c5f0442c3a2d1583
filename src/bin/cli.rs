//! Sesamo command line interface.

use std::{process, sync::atomic::Ordering};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use sesamo::{self as se, baud, ports, session};

fn main() {
    println!("[SE] sesamo v{}", crate_version!());

    let baud_rates = baud::labels();

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Sesamo opens a serial device in raw mode and prints everything it \
            receives. When no device is given, the tty devices found in the \
            device directory are offered for selection.\n\
            \n\
            While connected:\n\
               \t* q, Esc or Ctrl+C closes the device and exits \n\
               \t* Ctrl+L clears the screen \n\
               \t* t toggles the timestamps \n\
            \n\
            Timestamps are taken when the text is displayed and look like \
            [HH:MM:SS:mmm].\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the tty device to use")
                .long_help(
                    "the tty device to use; when not given, one of the \
                     devices found under the device directory is selected \
                     interactively.",
                )
                .short("-t")
                .long("--tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("-b")
                .long("--baud-rate")
                .takes_value(true)
                .possible_values(&baud_rates)
                .hide_possible_values(true)
                .default_value(baud::DEFAULT_BAUD_RATE)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DEVICE_ROOT")
                .help("directory scanned for tty devices")
                .short("-r")
                .long("--root")
                .takes_value(true)
                .default_value(ports::DEVICE_ROOT)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("RETRIES")
                .help("extra attempts to open the device, one second apart")
                .long("--retries")
                .takes_value(true)
                .default_value("0")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("TIMESTAMPS")
                .help("prefix every received line with the time it was shown")
                .short("-T")
                .long("--timestamps"),
        )
        .arg(
            Arg::with_name("LIST")
                .help("list the candidate tty devices and exit")
                .short("-l")
                .long("--list"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'sesamo -v -v -v' or 'sesamo -vvv' vs 'sesamo -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("{}: cannot set up logging: {}", style("warning").yellow(), e);
    }

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let root = matches.value_of("DEVICE_ROOT").unwrap();

    if matches.is_present("LIST") {
        match ports::list_devices(root) {
            Ok(devices) => {
                for device in devices {
                    println!("{}", device);
                }
                process::exit(0);
            }
            Err(e) => {
                println!(
                    "{}: cannot list devices under `{}`: {}",
                    style("error").red(),
                    style(root).cyan(),
                    e
                );
                process::exit(1);
            }
        }
    }

    let retries = value_t!(matches.value_of("RETRIES"), usize).unwrap_or_else(|_| {
        println!(
            "{}: `{}` needs to be a numeric value",
            style("error").red(),
            style("retries").cyan()
        );
        println!(
            "   {} `{}` is not a valid value",
            style("-->").cyan(),
            style(matches.value_of("RETRIES").unwrap()).on_red()
        );
        process::exit(-1);
    });

    let mut settings = se::SettingsBuilder::new()
        .baud_rate(matches.value_of("BAUD_RATE").unwrap())
        .device_root(root)
        .timestamps(matches.is_present("TIMESTAMPS"))
        .open_retries(retries)
        .finalize();

    // START - Arguments with NO default values ================================

    if matches.is_present("DEVICE_TTY") {
        settings.path = Some(matches.value_of("DEVICE_TTY").unwrap().into());
    }

    // END - Arguments =========================================================

    // Run the state machine ===================================================

    let mut session = session::factory(settings);

    // Outside of keyboard polling, Ctrl+C arrives as a signal. Ask the session
    // to wind down so the device is closed properly.
    let shutdown = session.shutdown_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        shutdown.store(true, Ordering::Release);
    }) {
        eprintln!("{}: cannot install the Ctrl+C handler: {}", style("warning").yellow(), e);
    }

    let exit_code = session.run();
    debug!("exit code: {}", exit_code);
    process::exit(exit_code.into());
}
