//! Prompt text sent to the models.

const EDIT_RULES: &str = r##"You are an assistant that edits PowerPoint presentations.
You do not write code. You reply with an EDIT PLAN: one JSON object in a single ```json fenced block, and nothing else.

The plan has the form {"operations": [ ... ]}. Each operation is an object whose "op" field names one of the helpers below. No other operation exists; a plan that uses anything else is rejected as a whole.

--- Helpers ---
- {"op": "delete_shapes_except", "slide": S, "keep": [REF, ...]}
    Remove every shape on the slide except the ones listed.
- {"op": "remove_connectors_and_lines", "slide": S}
    Remove all connectors and line shapes from the slide.
- {"op": "distribute_horizontally", "count": N, "box_width": LEN, "gap": LEN, "margin": LEN, "total_width": LEN, "as": "name"}
    Compute N left offsets for boxes laid out left to right and centred. gap defaults to 0, margin (the preferred space on each side) to 0.5in, total_width to the slide width. Fails if the boxes do not fit.
- {"op": "add_rounded_textbox", "slide": S, "text": "...", "left": LEN, "top": LEN, "width": LEN, "height": LEN, "fill_color": COLOR, "text_color": COLOR, "font_size": PT, "alignment": "left|center|right|justify", "anchor": "top|middle|bottom", "as": "name"}
    Add a rounded rectangle with word-wrapped text. Defaults: fill [232,244,248], text [50,50,50], 20pt, centred both ways. Use "\n" for line breaks.
- {"op": "add_arrow_between", "slide": S, "from": REF, "to": REF, "color": COLOR, "width": PT, "arrowhead": "triangle|stealth|diamond|oval|arrow", "as": "name"}
    Connect the right-middle of one shape to the left-middle of another with an arrow. Defaults: [70,70,70], 2.5pt, triangle.
- {"op": "add_slide", "layout": "Title and Content", "as": "name"}
    Append a slide using a layout from the structure listing.
- {"op": "set_title", "slide": S, "text": "..."}
    Set the text of the slide's title placeholder.

--- Values ---
- S (slide): 0-based index, so "page 6" is 5. Never use an index that is not in the structure listing. A "$name" bound by add_slide is also accepted.
- REF (shape): the integer ID from the structure listing, "title" for the title placeholder, or "$name" for a shape created earlier in the plan.
- LEN (length): an integer number of EMU, or a string expression of terms joined by + and -. A term is a number with a unit (in, pt, cm, mm, emu), slide_width, slide_height, $name[i] (an offset from distribute_horizontally), or $name.left/.top/.width/.height/.right/.bottom (a shape created earlier). A term may be scaled with * or /, e.g. "slide_width / 2 - 1.5in".
- COLOR: exactly three integers [r, g, b], each 0-255. "#RRGGBB" is also accepted.
- "as" binds the result of the operation to a name that later operations refer to with "$name".

--- Layout guidance ---
- For Chinese text, make boxes at least 15 characters * font size * 0.6 wide and font size * 1.5 per line tall, plus padding.
- Use harmonious, soft colors (e.g. a blue theme: [74,144,226], [80,227,194], [232,244,248]).
- Keep spacing and alignment consistent. Remove old connectors before drawing new ones."##;

const EDIT_EXAMPLE: &str = r#"--- Example: replace the bullets on the 6th slide with three boxes joined by arrows ---
```json
{"operations": [
  {"op": "delete_shapes_except", "slide": 5, "keep": ["title"]},
  {"op": "remove_connectors_and_lines", "slide": 5},
  {"op": "distribute_horizontally", "count": 3, "box_width": "3in", "gap": "0.2in", "as": "lefts"},
  {"op": "add_rounded_textbox", "slide": 5, "text": "項目一", "left": "$lefts[0]", "top": "2.5in", "width": "3in", "height": "2in", "as": "a"},
  {"op": "add_rounded_textbox", "slide": 5, "text": "項目二", "left": "$lefts[1]", "top": "2.5in", "width": "3in", "height": "2in", "as": "b"},
  {"op": "add_rounded_textbox", "slide": 5, "text": "項目三", "left": "$lefts[2]", "top": "2.5in", "width": "3in", "height": "2in", "as": "c"},
  {"op": "add_arrow_between", "slide": 5, "from": "$a", "to": "$b"},
  {"op": "add_arrow_between", "slide": 5, "from": "$b", "to": "$c"}
]}
```"#;

const VISUAL_NOTE: &str = "I have attached a PDF rendering of the current slides for your visual reference. Use it to understand layout, alignment and colors.";

/// Prompt asking for an edit plan.
pub fn edit_prompt(file_name: &str, summary: &str, instruction: &str, with_visual: bool) -> String {
    let mut prompt = String::with_capacity(EDIT_RULES.len() + summary.len() + 2048);
    prompt.push_str(EDIT_RULES);
    prompt.push_str("\n\n");
    prompt.push_str(EDIT_EXAMPLE);
    prompt.push_str("\n\n--- Target file ---\n");
    prompt.push_str(file_name);
    prompt.push_str("\n\n--- Current Presentation Structure ---\n");
    prompt.push_str(summary.trim_end());
    prompt.push_str("\n\n--- User Instruction ---\n");
    prompt.push_str(instruction.trim());
    if with_visual {
        prompt.push_str("\n\n");
        prompt.push_str(VISUAL_NOTE);
    }
    prompt.push('\n');
    prompt
}

/// Prompt asking the vision model to check the result.
pub fn validation_prompt(instruction: &str) -> String {
    format!(
        "You are a QA checker. Review the attached presentation PDF and compare it against the user's instruction.\n\
         Reply with one JSON object in a ```json fenced block: \
         {{\"satisfied\": true or false, \"discrepancies\": [\"...\"]}}.\n\
         List each mismatch or missing element as a short string; use an empty list when there are none.\n\n\
         --- User instruction ---\n{}\n\n--- PDF attached below ---\n",
        instruction.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::HELPER_NAMES;

    #[test]
    fn test_edit_prompt_lists_every_helper() {
        let prompt = edit_prompt("deck.pptx", "Presentation: deck.pptx", "do it", false);
        for name in HELPER_NAMES {
            assert!(prompt.contains(&format!("\"op\": \"{}\"", name)), "{}", name);
        }
        assert!(!prompt.contains(VISUAL_NOTE));
    }

    #[test]
    fn test_edit_rules_are_complete() {
        assert!(EDIT_RULES.contains("\"#RRGGBB\" is also accepted."));
        assert!(EDIT_RULES.ends_with("Remove old connectors before drawing new ones."));
    }

    #[test]
    fn test_edit_prompt_order() {
        let prompt = edit_prompt("deck.pptx", "SUMMARY\n\n", "  make three boxes ", true);
        let summary = prompt.find("SUMMARY").unwrap();
        let instruction = prompt.find("make three boxes").unwrap();
        assert!(prompt.find("deck.pptx").unwrap() < summary);
        assert!(summary < instruction);
        assert!(prompt.ends_with(&format!("{}\n", VISUAL_NOTE)));
    }

    #[test]
    fn test_validation_prompt() {
        let prompt = validation_prompt("three boxes");
        assert!(prompt.contains("\"satisfied\""));
        assert!(prompt.contains("three boxes"));
    }
}
