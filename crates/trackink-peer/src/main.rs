//! Command-line trackink peer.
//!
//! As a surface it joins a channel and renders committed paths to the log.
//! As a controller it sends the test stroke, a command, or lines read from
//! stdin.

mod args;
mod script;
mod session;
mod surface;

use args::{PeerArgs, Role};
use clap::Parser;
use std::process::ExitCode;
use trackink_core::auth::ensure_authorized;
use trackink_core::{AllowAll, AuthGuard, TokenGuard};

fn guard(args: &PeerArgs) -> Box<dyn AuthGuard> {
    match &args.expected_token {
        Some(expected) => Box::new(TokenGuard::new(expected.clone(), args.token.clone())),
        None => Box::new(AllowAll),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = PeerArgs::parse();
    log::info!("Starting trackink {:?} on channel {}", args.role, args.channel);

    let result = ensure_authorized(guard(&args).as_ref())
        .map_err(session::PeerError::from)
        .and_then(|()| match args.role {
            Role::Surface => session::run_surface(&args),
            Role::Controller => session::run_controller(&args),
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
