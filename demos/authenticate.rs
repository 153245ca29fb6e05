use std::time::Duration;

use anyhow::{Context, Result};

use smartid::{AuthRequest, CancelSignal, Client, SemanticIdentifier};

fn main() -> Result<()> {
    // demo environment test account unless one is given, e.g. PNOEE-30303039914
    let person: SemanticIdentifier = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "PNOEE-30303039914".to_string())
        .parse()
        .context("could not parse the semantic identifier")?;

    let client = Client::builder()
        .relying_party("00000000-0000-0000-0000-000000000000", "DEMO")
        .build()?;

    let request = AuthRequest::for_person(&person);
    println!("verification code: {}", request.verification_code());

    let response = client.authenticate_blocking(
        request,
        &CancelSignal::deadline(Duration::from_secs(180)),
    )?;

    if let Err(e) = response.validate().into_result() {
        println!("authentication failed: {e}");
        return Ok(());
    }

    let identity = response
        .identity()
        .ok_or_else(|| anyhow::anyhow!("no identity in a valid response"))?;
    println!(
        "authenticated {} {} ({})",
        identity.given_name, identity.surname, identity.serial_number
    );
    Ok(())
}
