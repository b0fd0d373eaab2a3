//! Generate Command

use anyhow::{ensure, Result};
use bookcheck_common::BookingPayload;
use chrono::{NaiveDate, Utc};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Seed for reproducible payloads
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of payloads to generate
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Reference date for check-in (YYYY-MM-DD, default today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

impl TableDisplay for BookingPayload {
    fn headers() -> Vec<&'static str> {
        vec!["Guest", "Price", "Deposit", "Check-in", "Check-out", "Needs"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format!("{} {}", self.firstname, self.lastname),
            self.totalprice.to_string(),
            if self.depositpaid { "paid" } else { "unpaid" }.to_string(),
            self.bookingdates.checkin.clone(),
            self.bookingdates.checkout.clone(),
            self.additionalneeds.clone().unwrap_or_else(|| "-".to_string()),
        ]
    }
}

pub fn generate(args: &GenerateArgs) -> Result<Vec<BookingPayload>> {
    ensure!(args.count > 0, "--count must be at least 1");

    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((0..args.count)
        .map(|_| BookingPayload::generate(&mut rng, today))
        .collect())
}

pub fn execute(args: GenerateArgs, format: OutputFormat) -> Result<()> {
    print_list(&generate(&args)?, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookcheck_common::{booking, validate};

    fn args(seed: u64, count: usize) -> GenerateArgs {
        GenerateArgs {
            seed: Some(seed),
            count,
            today: NaiveDate::from_ymd_opt(2026, 6, 1),
        }
    }

    #[test]
    fn test_seeded_generation_repeats() {
        let first = generate(&args(9, 3)).unwrap();
        let second = generate(&args(9, 3)).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_payloads_satisfy_schema() {
        for payload in generate(&args(1, 20)).unwrap() {
            let value = payload.to_value();
            assert!(validate(&value, &value, booking::strict_schema()).valid);
        }
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(generate(&args(1, 0)).is_err());
    }
}
