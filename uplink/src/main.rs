extern crate clap;
extern crate serde_json;
extern crate uplink;

use clap::{App, Arg};
use std::fs::File;
use std::io::{BufRead, BufReader};
use uplink::{Decoder, Passthrough, Schema};

fn main() {
    let matches = App::new("uplink")
        .about("decodes asset-tracker uplink messages to JSON, one per line")
        .arg(
            Arg::with_name("FILE")
                .help("a file with one raw uplink message per line")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("schema")
                .short("s")
                .long("schema")
                .takes_value(true)
                .help("the protocol schema version (defaults to the latest)"),
        )
        .get_matches();

    let schema = match matches.value_of("schema") {
        Some(version) => Schema::get(version.parse().unwrap()).unwrap(),
        None => Schema::latest(),
    };
    let decoder = Decoder::new(schema, Box::new(Passthrough));

    let file = File::open(matches.value_of("FILE").unwrap()).unwrap();
    for line in BufReader::new(file).lines() {
        let line = line.unwrap();
        if line.trim().is_empty() {
            continue;
        }
        match decoder.decode(&line) {
            Ok(record) => println!("{}", serde_json::to_string(&record).unwrap()),
            Err(err) => eprintln!("{}", err),
        }
    }
}
