//! Dice rolling for skill checks and saving rolls.
//!
//! Accepts standard tabletop notation (`d20`, `3d6+2`, `2d8-1`) and
//! returns a textual result the model can weave back into the narration.

use crate::errors::EngineError;
use crate::llm::ToolSchema;
use crate::tools::Tool;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;

pub struct DiceRollTool;

impl DiceRollTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiceRollTool {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed `NdS+M` notation.
#[derive(Debug, PartialEq, Eq)]
pub struct DiceNotation {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

pub fn parse_notation(notation: &str) -> Result<DiceNotation, String> {
    let trimmed = notation.trim().to_lowercase();
    let (dice_part, modifier) = match trimmed.find(['+', '-']) {
        Some(idx) => {
            let modifier: i32 = trimmed[idx..]
                .parse()
                .map_err(|_| format!("invalid modifier in '{}'", notation))?;
            (&trimmed[..idx], modifier)
        }
        None => (trimmed.as_str(), 0),
    };

    let (count_part, sides_part) = dice_part
        .split_once('d')
        .ok_or_else(|| format!("'{}' is not dice notation like 'd20' or '3d6+2'", notation))?;

    let count: u32 = if count_part.is_empty() {
        1
    } else {
        count_part
            .parse()
            .map_err(|_| format!("invalid dice count in '{}'", notation))?
    };
    let sides: u32 = sides_part
        .parse()
        .map_err(|_| format!("invalid die size in '{}'", notation))?;

    if count == 0 || count > MAX_DICE {
        return Err(format!("dice count must be between 1 and {}", MAX_DICE));
    }
    if sides < 2 || sides > MAX_SIDES {
        return Err(format!("die size must be between 2 and {}", MAX_SIDES));
    }

    Ok(DiceNotation {
        count,
        sides,
        modifier,
    })
}

fn roll(notation: &DiceNotation, rng: &mut impl Rng) -> (Vec<u32>, i64) {
    let rolls: Vec<u32> = (0..notation.count)
        .map(|_| rng.random_range(1..=notation.sides))
        .collect();
    let total = rolls.iter().map(|&r| r as i64).sum::<i64>() + notation.modifier as i64;
    (rolls, total)
}

#[async_trait]
impl Tool for DiceRollTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "roll_dice".to_string(),
            description: "Rolls dice using tabletop notation such as 'd20', '3d6+2' or '2d8-1' and reports the individual dice and the total".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "notation": {
                        "type": "string",
                        "description": "Dice notation, e.g. 'd20' or '3d6+2'"
                    },
                    "reason": {
                        "type": "string",
                        "description": "What the roll is for, e.g. 'perception check'"
                    }
                },
                "required": ["notation"]
            }),
        }
    }

    fn group(&self) -> &'static str {
        "dice"
    }

    async fn execute(&self, arguments: Value) -> Result<String, EngineError> {
        let notation_str = arguments
            .get("notation")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Tool {
                tool_name: "roll_dice".to_string(),
                message: "missing or invalid 'notation' parameter".to_string(),
            })?;

        let notation = parse_notation(notation_str).map_err(|message| EngineError::Tool {
            tool_name: "roll_dice".to_string(),
            message,
        })?;

        let mut rng = rand::rng();
        let (rolls, total) = roll(&notation, &mut rng);

        log::info!("roll_dice {}: {:?} = {}", notation_str, rolls, total);

        let result = if notation.count == 1 && notation.modifier == 0 {
            format!("{}", total)
        } else {
            format!("{} (rolled {:?})", total, rolls)
        };
        Ok(result)
    }
}
