extern crate actix_web;
extern crate clap;
extern crate env_logger;
extern crate listenfd;
extern crate web;

use actix_web::server;
use clap::{App, Arg};
use web::State;

fn main() {
    env_logger::init().unwrap();
    let matches = App::new("tracklog-web")
        .about("serves the asset-tracker JSON API")
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
        )
        .get_matches();

    let addr = matches.value_of("ADDR").unwrap();
    let state = State::from_path(matches.value_of("CONFIG").unwrap()).unwrap();
    let auto_reload = matches.is_present("auto-reload");

    if auto_reload {
        use listenfd::ListenFd;
        let mut listenfd = ListenFd::from_env();
        let mut server = server::new(move || web::create_app(state.clone()));
        server = if let Some(l) = listenfd.take_tcp_listener(0).unwrap() {
            server.listen(l)
        } else {
            server.bind(addr).unwrap()
        };
        server.run();
    } else {
        server::new(move || web::create_app(state.clone()))
            .bind(addr)
            .unwrap()
            .run()
    }
}
