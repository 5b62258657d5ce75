extern crate actix_web;
extern crate clap;
extern crate env_logger;
extern crate listenfd;
#[macro_use]
extern crate log;
#[macro_use]
extern crate prettytable;
extern crate serde_json;
extern crate tracker;
extern crate uplink;
extern crate web;

use clap::{App, Arg, SubCommand};
use prettytable::{format, Table};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::ToSocketAddrs;
use tracker::{Registry, Spool};
use uplink::{Decoder, Passthrough, Schema};

fn main() {
    env_logger::init().unwrap();
    let schema_arg = Arg::with_name("schema")
        .short("s")
        .long("schema")
        .takes_value(true)
        .help("the protocol schema version (defaults to the latest)");
    let matches = App::new("tracklog")
        .about("decode, inspect, and serve asset-tracker uplinks")
        .subcommand(
            SubCommand::with_name("decode")
                .about("decodes a file of raw messages to JSON")
                .arg(
                    Arg::with_name("FILE")
                        .help("a file with one raw uplink message per line")
                        .required(true)
                        .index(1),
                )
                .arg(schema_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("devices")
                .about("summarizes the devices seen in a message spool")
                .arg(
                    Arg::with_name("ROOT")
                        .help("the root directory of the message spool")
                        .required(true)
                        .index(1),
                )
                .arg(schema_arg),
        )
        .subcommand(
            SubCommand::with_name("serve")
                .about("serves the json api")
                .arg(
                    Arg::with_name("ADDR")
                        .help("the address from which to serve the json api")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("CONFIG")
                        .help("the path to the configuration toml file")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::with_name("auto-reload")
                        .long("auto-reload")
                        .help("enable the auto-reloading development server"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("decode") {
        let decoder = decoder(matches.value_of("schema"));
        decode(matches.value_of("FILE").unwrap(), &decoder);
    } else if let Some(matches) = matches.subcommand_matches("devices") {
        let decoder = decoder(matches.value_of("schema"));
        devices(matches.value_of("ROOT").unwrap(), &decoder);
    } else if let Some(matches) = matches.subcommand_matches("serve") {
        let addr = matches.value_of("ADDR").unwrap();
        let state = web::State::from_path(matches.value_of("CONFIG").unwrap()).unwrap();
        let auto_reload = matches.is_present("auto-reload");
        serve(addr, state, auto_reload);
    }
}

fn decoder(version: Option<&str>) -> Decoder {
    let schema = match version {
        Some(version) => Schema::get(version.parse().unwrap()).unwrap(),
        None => Schema::latest(),
    };
    Decoder::new(schema, Box::new(Passthrough))
}

fn decode(path: &str, decoder: &Decoder) {
    let file = File::open(path).unwrap();
    for line in BufReader::new(file).lines() {
        let line = line.unwrap();
        if line.trim().is_empty() {
            continue;
        }
        match decoder.decode(&line) {
            Ok(record) => println!("{}", serde_json::to_string_pretty(&record).unwrap()),
            Err(err) => warn!("{}", err),
        }
    }
}

fn devices(root: &str, decoder: &Decoder) {
    let spool = Spool::open(root).unwrap();
    let registry = Registry::from_spool(&spool, decoder).unwrap();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["Device", "Last seen", "Records", "Gaps"]);
    for device in registry.devices() {
        let last_seen = device
            .last_seen()
            .map(|datetime| datetime.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        table.add_row(row![
            device.id(),
            last_seen,
            device.len(),
            device.gaps().len()
        ]);
    }
    table.printstd();

    if !registry.rejects().is_empty() {
        println!("{} message(s) did not match the envelope", registry.rejects().len());
    }
}

fn serve<S: ToSocketAddrs>(addr: S, state: web::State, auto_reload: bool) {
    if auto_reload {
        use listenfd::ListenFd;
        let mut listenfd = ListenFd::from_env();
        let mut server = actix_web::server::new(move || web::create_app(state.clone()));
        server = if let Some(l) = listenfd.take_tcp_listener(0).unwrap() {
            server.listen(l)
        } else {
            server.bind(addr).unwrap()
        };
        server.run();
    } else {
        actix_web::server::new(move || web::create_app(state.clone()))
            .bind(addr)
            .unwrap()
            .run()
    }
}
