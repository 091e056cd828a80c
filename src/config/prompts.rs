//! Prompt template for retrieval-augmented answers.
//!
//! The default template can be replaced by placing a `rag.toml` file in the
//! custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// A demonstration query/answer pair that steers the answer style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub query: String,
    pub answer: String,
}

impl FewShotExample {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
        }
    }
}

/// Sections of the retrieval-augmented prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Task instructions placed at the top of the prompt.
    pub instructions: String,
    /// Few-shot examples, rendered in order.
    pub examples: Vec<FewShotExample>,
    /// Line introducing the retrieved context items.
    pub context_header: String,
    /// Cue placed between the context and the user query.
    pub passages_cue: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            instructions: r#"Based on the following context items, please answer the query.
Give yourself room to think by extracting relevant passages from the context before answering the query.
Don't return the thinking, only return the answer.
Make sure your answers are as explanatory as possible.
Use the following examples as reference for the ideal answer style."#
                .to_string(),

            examples: default_examples(),

            context_header: "Now use the following context items to answer the user query:"
                .to_string(),

            passages_cue: "Relevant passages: <extract relevant passages from the context here>"
                .to_string(),
        }
    }
}

fn default_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample::new(
            "What are the safety guidelines for handling Machine 23 in a chemical plant?",
            "Safety guidelines for handling Machine 23 in a chemical plant include several precautions to ensure operator safety and minimize the risk of accidents. These guidelines typically include wearing personal protective equipment (PPE) such as gloves, goggles, and flame-resistant clothing. Operators should also be trained in emergency shutdown procedures in case of equipment malfunction. It's important to regularly inspect Machine 23 for signs of wear or potential failure. Proper lockout/tagout (LOTO) procedures should be followed to ensure that the machine is de-energized during maintenance activities. Additionally, operators must be aware of the specific hazards associated with the chemicals being processed, such as flammability, toxicity, or corrosiveness.",
        ),
        FewShotExample::new(
            "How can an MES help improve inventory management in a chemical manufacturing facility?",
            "A Manufacturing Execution System (MES) can significantly improve inventory management in a chemical manufacturing facility by providing real-time tracking of raw materials, intermediate products, and finished goods. Through integration with sensors and automated systems, MES allows for accurate tracking of inventory levels, usage rates, and production status. This real-time data helps prevent stockouts or overstocking by providing insights into material demand and supply. Additionally, MES can generate automatic alerts for reordering materials, reducing the chances of human error and improving overall efficiency in the supply chain.",
        ),
        FewShotExample::new(
            "What are the common challenges when implementing an MES in a chemical plant?",
            "Common challenges when implementing a Manufacturing Execution System (MES) in a chemical plant include system integration, data accuracy, and employee training. Integrating MES with existing systems, such as Enterprise Resource Planning (ERP) or process control systems, can be complex and may require significant customization. Ensuring accurate data input is crucial, as MES systems rely on precise data to optimize operations, and incorrect information can lead to errors in production scheduling or inventory management. Additionally, employees must be trained to effectively use the MES system, which may require overcoming resistance to change and adapting to new workflows. Adequate support and continuous monitoring are also necessary to ensure the system operates effectively post-implementation.",
        ),
    ]
}

impl Prompts {
    /// Load prompts, overriding the defaults with `rag.toml` from `custom_dir` if present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }
}
