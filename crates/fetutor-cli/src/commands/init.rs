//! The `fetutor init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_once(Path::new("fetutor.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("problems")?;
    write_once(Path::new("problems/fe-sample.toml"), SAMPLE_BANK)?;

    println!("\nNext steps:");
    println!("  1. Export FETUTOR_GEMINI_KEY (or edit fetutor.toml)");
    println!("  2. Run: fetutor validate --bank problems");
    println!("  3. Run: fetutor session --problem D1 --user <your name>");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# fetutor configuration

default_provider = "gemini"
default_model = "gemini-2.0-flash"
temperature = 0.0
tolerance = 0.05
subject = "Statics"
app_name = "Statics Tutor"
recipient = "instructor@example.edu"
notify_on_skip = false
bank = "./problems"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[notifier]
type = "log"
"#;

const SAMPLE_BANK: &str = r#"[[problems]]
id = "D1"
category = "Dynamics"
statement = "A car accelerates at a(t) = 2t^2 + 2 with an initial velocity of 10 m/s. How fast is the car traveling after 3 s?"
targets = [{ name = "v_final", value = 34.0 }]
options = ["34 m/s", "50 m/s", "60 m/s", "97 m/s"]
correct_option = "34 m/s"
explanation = "Integrate a(t): v(t) = (2/3)t^3 + 2t + C. With v(0) = 10, C = 10. At t = 3 s, v = 18 + 6 + 10 = 34 m/s."

[[problems]]
id = "T1"
category = "Thermodynamics"
statement = "A parallel flow heat exchanger has dT1 = 250 K and dT2 = 50 K. What is the log mean temperature difference (LMTD)?"
targets = [{ name = "LMTD", value = 124.27 }]
options = ["124.3 K", "150.0 K", "200.0 K", "100.0 K"]
correct_option = "124.3 K"
explanation = "LMTD = (dT1 - dT2) / ln(dT1 / dT2) = 200 / ln(5) = 124.27 K."

[[problems]]
id = "M1"
category = "Mechanics of Materials"
statement = "An aluminum rod (d = 12 mm, nu = 0.35) experiences a longitudinal strain of -0.002. What is the increase in diameter, in micrometres?"
targets = [{ name = "delta_d", value = 8.4 }]
options = ["8.4 um", "4.2 um", "12.0 um", "0.35 um"]
correct_option = "8.4 um"
explanation = "Lateral strain = -nu * strain = 0.0007. delta_d = 0.0007 * 12 mm = 0.0084 mm = 8.4 um."

[[problems]]
id = "S1"
category = "Statics"
statement = "A 4 m simply supported beam carries a 100 N point load 1 m from support A. Find both support reactions."
targets = [
    { name = "R_A", value = 75.0 },
    { name = "R_B", value = 25.0 },
]
explanation = "Sum of moments about A: R_B * 4 = 100 * 1, so R_B = 25 N. Sum of vertical forces: R_A = 100 - 25 = 75 N."
"#;
