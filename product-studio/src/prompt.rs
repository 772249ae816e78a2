//! Composite instruction sent alongside the source image.

use product_studio_types::studio::Angle;

/// 用户未填写风格时使用的默认风格。
pub const DEFAULT_STYLE: &str =
    "Clean professional smartphone photo, natural lighting, realistic indoor background.";

const CRITICAL_RULES: [&str; 7] = [
    "Preserve the product's core identity (shape, color, texture).",
    "Make it look like a real photo taken on an iPhone/Smartphone.",
    "Product should occupy 60-80% of the frame.",
    "Sharp focus on the entire product.",
    "Authentic shadows and realistic surface reflections.",
    "No AI artifacts, no impossible geometry, no blurry edges.",
    "Do NOT create a collage. Single image output.",
];

/// 组合角度指令与风格提示词。风格为空白时使用 [`DEFAULT_STYLE`]。
#[must_use]
pub fn compose_instruction(angle: &Angle, style: Option<&str>) -> String {
    let style = style
        .map(str::trim)
        .filter(|style| !style.is_empty())
        .unwrap_or(DEFAULT_STYLE);

    let mut instruction = String::from(
        "You are a professional smartphone photographer for an e-commerce marketplace.\n\
         TASK: Take the provided source image and generate a new high-quality photograph from a specific angle.\n",
    );
    instruction.push_str(&format!("ANGLE: {}\n", angle.instruction));
    instruction.push_str(&format!("STYLE INSTRUCTIONS: {style}\n\nCRITICAL RULES:\n"));
    for rule in CRITICAL_RULES {
        instruction.push_str("- ");
        instruction.push_str(rule);
        instruction.push('\n');
    }
    instruction
}
