use std::net::Ipv4Addr;

use clap::builder::ValueParser;
use clap::{Arg, Command};
use log::{debug, error};
use nat_discovery::config::{DiscoveryConfig, DEFAULT_STUN_HOST, DEFAULT_STUN_PORT};
use nat_discovery::discovery::run_discovery;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_ip(s: &str) -> Result<Ipv4Addr, String> {
    let ip = match s.parse::<Ipv4Addr>() {
        Ok(v) => v,
        Err(e) => {
            return Err(format!("{}", e));
        }
    };
    // 不能是 0.0.0.0, 不指定就是 0.0.0.0
    if ip.is_unspecified() {
        return Err("0.0.0.0 not allow".to_string());
    }

    Ok(ip)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let default_port = DEFAULT_STUN_PORT.to_string();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("probe the local nat type with a rfc 3489 stun server")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .default_value(DEFAULT_STUN_HOST)
                .help("stun server host")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .default_value(&default_port)
                .help("stun server port")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("alt_port")
                .long("alt_port")
                .takes_value(true)
                .help("expected alternative port, only checked against CHANGED-ADDRESS")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("local_ip")
                .long("local_ip")
                .takes_value(true)
                .help("local ip, default all interfaces")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .get_matches();

    let config = DiscoveryConfig {
        server_host: app
            .get_one::<String>("server")
            .cloned()
            .unwrap_or_else(|| DEFAULT_STUN_HOST.to_string()),
        server_port: app
            .get_one::<u16>("port")
            .copied()
            .unwrap_or(DEFAULT_STUN_PORT),
        alt_port: app.get_one::<u16>("alt_port").copied(),
        local_ip: app
            .get_one::<Ipv4Addr>("local_ip")
            .copied()
            .unwrap_or(Ipv4Addr::UNSPECIFIED),
    };
    debug!("{:?}", config);

    match run_discovery(&config).await {
        Ok(nat_type) => {
            println!("{}", nat_type);
            println!("traversal: {}", nat_type.traversal());
        }
        Err(e) => {
            error!("error, run_discovery, {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
