//! Narrative text handed to extraction providers.

use schedulr_domain::RawMessageFragment;

/// Concatenate fragments in arrival order, each prefixed with its sender or
/// provenance label and with links rendered inline. Fragments are separated
/// by a blank line.
pub fn build_narrative(fragments: &[RawMessageFragment]) -> String {
    let mut narrative = String::new();
    for fragment in fragments {
        narrative.push_str(&fragment.label());
        narrative.push_str(": ");
        narrative.push_str(&fragment.rendered_text());
        narrative.push_str("\n\n");
    }
    narrative
}
