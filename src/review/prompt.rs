//! The fixed review instruction.
//!
//! One prompt, defined at compile time and sent verbatim ahead of every
//! drawing. The model is asked for a Markdown table; nothing downstream
//! depends on it actually producing one.

/// Review items the model must cover, in order.
pub const REVIEW_ITEMS: [&str; 4] = ["材质", "数量", "公差", "表面处理"];

/// Columns of the requested review table.
pub const REVIEW_COLUMNS: [&str; 3] = ["审核项", "状态", "提取内容/问题"];

/// Instruction sent with every drawing.
///
/// Role: senior DFM (design-for-manufacturability) review engineer.
/// Task: read the drawing and extract its key attributes.
/// Output: a Markdown table of [review item], [status], [extracted content/issue]
/// covering material, quantity, tolerance and surface finish.
pub const REVIEW_PROMPT: &str = "Role: 资深 DFM 审核工程师
Task: 分析图纸，提取关键要素。
Output Format: 请直接输出 Markdown 表格，包含列：[审核项], [状态], [提取内容/问题]。
关键审核项: 1.材质 2.数量 3.公差 4.表面处理。";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_not_empty() {
        assert!(!REVIEW_PROMPT.trim().is_empty());
    }

    #[test]
    fn test_prompt_names_every_column() {
        for column in REVIEW_COLUMNS {
            assert!(REVIEW_PROMPT.contains(&format!("[{column}]")), "{column}");
        }
    }

    #[test]
    fn test_prompt_lists_items_in_order() {
        let positions: Vec<usize> = REVIEW_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| REVIEW_PROMPT.find(&format!("{}.{item}", i + 1)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prompt_sets_role_and_format() {
        assert!(REVIEW_PROMPT.starts_with("Role:"));
        assert!(REVIEW_PROMPT.contains("DFM"));
        assert!(REVIEW_PROMPT.contains("Markdown"));
    }
}
