use dynform::{CompanyConfig, DynFormUI, UiOptions};
use serde_json::json;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> AppResult<()> {
    let document = json!({
        "Acme Retail": {
            "FormFields": [
                {"Label": "Store Name", "Type": "text", "Validation": {"required": true}},
                {"Label": "Contact Email", "Type": "email", "Validation": {"required": true}},
                {"Label": "Fleet Size", "Type": "number"},
                {
                    "Label": "Region",
                    "Type": "select",
                    "Validation": {"required": true},
                    "Options": ["North", "South", "East", "West"]
                },
                {
                    "Label": "Store Code",
                    "Type": "text",
                    "Validation": {
                        "required": true,
                        "pattern": "^[A-Z]{3}-[0-9]{3}$",
                        "patternDescription": "Use the AAA-000 store code format"
                    }
                }
            ]
        },
        "Globex Logistics": {
            "FormFields": [
                {"Label": "Depot City", "Type": "text", "Validation": {"required": true}},
                {"Label": "Opened On", "Type": "date"},
                {"Label": "Notes", "Type": "textarea"}
            ]
        }
    });

    let config = CompanyConfig::from_value(&document)?;
    let submission = DynFormUI::new(config)
        .with_title("Celfocus Companies")
        .with_options(UiOptions::default().with_auto_validate(true))
        .run()?;

    match submission {
        Some(submission) => {
            println!("submitted for {}:", submission.company);
            println!("{}", serde_json::to_string_pretty(&submission.record)?);
        }
        None => println!("exited without submitting"),
    }
    Ok(())
}
