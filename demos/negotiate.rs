// demos/negotiate.rs

//! Print the `Negotiate` challenge for a Kerberos-protected URL.
//!
//! Requires a valid ticket in the default credential cache (`kinit`).
//!
//! # Usage
//!
//! ```bash
//! cargo run --example negotiate --features gssapi -- http://broker.corp:8082/druid/v2
//! ```

#[cfg(all(unix, feature = "gssapi"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use negotiate_session::{ChallengeGenerator, CookieSessionPolicy, CurrentUser, MemoryCookieStore, Url};

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: negotiate <url>");
        std::process::exit(1);
    }
    let url = Url::parse(&args[1])?;

    // a fresh client has no session cookie yet
    let store = MemoryCookieStore::new();
    let policy = CookieSessionPolicy::new();
    if !policy.needs_credentials(Some(&store), &url)? {
        println!("session cookie present, no challenge needed");
        return Ok(());
    }

    let token = ChallengeGenerator::gssapi().challenge_for_url(&url, &CurrentUser)?;
    println!("Authorization: Negotiate {}", token);
    Ok(())
}

#[cfg(not(all(unix, feature = "gssapi")))]
fn main() {
    eprintln!("This demo requires the `gssapi` feature on a unix target.");
    eprintln!("Run with: cargo run --example negotiate --features gssapi -- <url>");
}
