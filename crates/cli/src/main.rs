use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use clinrec_core::{
    due_date,
    socioeconomics::FamilyApgar,
    surgery::{AgeAtSurgery, CardiacRiskFactors},
    Catalogue, ClinicalResult, GestationalAge,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "clinrec")]
#[command(about = "Clinical records calculators and catalogue tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Presumed delivery date from the last menstrual period
    DueDate {
        /// Last menstrual period (YYYY-MM-DD)
        lmp: NaiveDate,
    },
    /// Gestational age on a given date
    GestationalAge {
        /// Last menstrual period (YYYY-MM-DD)
        lmp: NaiveDate,
        /// Observation date (YYYY-MM-DD)
        on: NaiveDate,
    },
    /// Revised Cardiac Risk Index
    Rcri(RcriArgs),
    /// Family APGAR score (each answer 0-2)
    FamilyApgar {
        help: u8,
        discussion: u8,
        decisions: u8,
        timesharing: u8,
        affection: u8,
    },
    /// Age on a given date, as years, months and days
    Age {
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: NaiveDate,
        /// Reference date (YYYY-MM-DD)
        on: NaiveDate,
    },
    /// Validate a test-type catalogue file
    CheckCatalogue {
        /// Path to the catalogue YAML
        path: PathBuf,
    },
}

#[derive(Args)]
struct RcriArgs {
    /// High-risk surgery
    #[arg(long)]
    high_risk_surgery: bool,
    /// History of ischemic heart disease
    #[arg(long)]
    ischemic: bool,
    /// History of congestive heart failure
    #[arg(long)]
    congestive: bool,
    /// Pre-operative insulin treatment
    #[arg(long)]
    diabetes: bool,
    /// History of cerebrovascular disease
    #[arg(long)]
    cerebrovascular: bool,
    /// Pre-operative creatinine above 2 mg/dL
    #[arg(long)]
    kidney: bool,
}

fn check_catalogue(path: &Path) -> ClinicalResult<String> {
    let catalogue = Catalogue::load(path)?;
    Ok(format!(
        "Catalogue OK: {} lab test type(s), {} imaging test type(s)",
        catalogue.lab_tests.len(),
        catalogue.imaging_tests.len()
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::DueDate { lmp }) => match due_date(lmp) {
            Some(pdd) => println!("Presumed delivery date: {}", pdd),
            None => eprintln!("No due date can be computed from {}", lmp),
        },
        Some(Commands::GestationalAge { lmp, on }) => {
            let age = GestationalAge::between(lmp, on);
            println!(
                "Gestational age on {}: {} weeks ({} days)",
                on,
                age.weeks(),
                age.days()
            );
        }
        Some(Commands::Rcri(args)) => {
            let factors = CardiacRiskFactors {
                rcri_high_risk_surgery: args.high_risk_surgery,
                rcri_ischemic_history: args.ischemic,
                rcri_congestive_history: args.congestive,
                rcri_diabetes_history: args.diabetes,
                rcri_cerebrovascular_history: args.cerebrovascular,
                rcri_kidney_history: args.kidney,
            };
            println!("RCRI total: {}, class {}", factors.total(), factors.class());
        }
        Some(Commands::FamilyApgar {
            help,
            discussion,
            decisions,
            timesharing,
            affection,
        }) => {
            let apgar = FamilyApgar {
                fam_apgar_help: Some(help),
                fam_apgar_discussion: Some(discussion),
                fam_apgar_decisions: Some(decisions),
                fam_apgar_timesharing: Some(timesharing),
                fam_apgar_affection: Some(affection),
            };
            println!("Family APGAR score: {}", apgar.score());
        }
        Some(Commands::Age { date_of_birth, on }) => {
            let at = on.and_hms_opt(0, 0, 0);
            println!("{}", AgeAtSurgery::compute(Some(date_of_birth), at));
        }
        Some(Commands::CheckCatalogue { path }) => println!("{}", check_catalogue(&path)?),
        None => {
            println!("Use 'clinrec --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinrec_core::ClinicalError;
    use std::io::Write;

    #[test]
    fn test_check_catalogue_counts_types() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "lab_tests:\n  - code: CBC\n    name: Complete blood count\nimaging_tests: []"
        )
        .unwrap();

        assert_eq!(
            check_catalogue(file.path()).unwrap(),
            "Catalogue OK: 1 lab test type(s), 0 imaging test type(s)"
        );
    }

    #[test]
    fn test_check_catalogue_fails_on_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            check_catalogue(&missing),
            Err(ClinicalError::FileRead(_))
        ));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "lab_tests:\n  - code: CBC\n    name: Blood\n    colour: red\n").unwrap();
        assert!(matches!(
            check_catalogue(&bad),
            Err(ClinicalError::Catalogue(_))
        ));
    }
}
