//! `sysdl synth` — synthesize argument assignments.

use std::path::Path;

use anyhow::{bail, Context, Result};

use sysdl_core::OperationKey;
use sysdl_synth::{Policy, Session};

use crate::commands::load_model;

#[allow(clippy::too_many_arguments)]
pub fn run(
    catalogue: &Path,
    registry: &Path,
    ops: &[String],
    seed: Option<u64>,
    boundary: bool,
    pins: &[String],
    len_pins: &[String],
    invalid: Option<&str>,
    json: bool,
) -> Result<()> {
    let model = load_model(catalogue, registry)?;

    let mut policy = if boundary {
        Policy::boundary_biased()
    } else {
        Policy::uniform()
    };
    if let Some(seed) = seed {
        policy = policy.with_seed(seed);
    }
    for pin in pins {
        let (name, value) = split_pin(pin)?;
        policy = policy.pin(name, parse_int(value)?);
    }
    for pin in len_pins {
        let (name, value) = split_pin(pin)?;
        policy = policy.pin_len(
            name,
            u64::try_from(parse_int(value)?)
                .with_context(|| format!("length pin '{pin}' must be non-negative"))?,
        );
    }

    let keys: Vec<OperationKey> = ops.iter().map(|text| OperationKey::parse(text)).collect();
    let mut session = Session::new(&model, policy)?;

    if let Some(param) = invalid {
        let [key] = keys.as_slice() else {
            bail!("--invalid applies to exactly one operation");
        };
        let (assignment, violation) = session.synthesize_invalid(key, param)?;
        if json {
            let payload = serde_json::json!({
                "assignment": assignment,
                "violation": violation,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            println!("{assignment}");
            println!(
                "violated {} on '{}': {}",
                violation.constraint, violation.parameter, violation.detail
            );
        }
        return Ok(());
    }

    let assignments = session.synthesize_sequence(&keys)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&assignments)?);
    } else {
        for assignment in &assignments {
            println!("{assignment}");
        }
    }
    Ok(())
}

fn split_pin(pin: &str) -> Result<(&str, &str)> {
    pin.split_once('=')
        .ok_or_else(|| anyhow::anyhow!("pin '{pin}' is not of the form name=value"))
}

fn parse_int(text: &str) -> Result<i128> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => body.parse(),
    }
    .with_context(|| format!("'{text}' is not an integer"))?;
    Ok(if negative { -value } else { value })
}
