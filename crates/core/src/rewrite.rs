//! Applies a translation map back onto collected runs.

use crate::batch::TranslationMap;
use crate::types::Run;

/// Replace the text of every run whose text is a key of `translations`.
///
/// Runs without an entry are left untouched. Returns the number of runs whose
/// text actually changed.
pub fn apply_translations(runs: &mut [&mut Run], translations: &TranslationMap) -> usize {
    let mut changed = 0;
    for run in runs.iter_mut() {
        let Some(translated) = translations.get(run.text()) else {
            continue;
        };
        if translated != run.text() {
            let translated = translated.clone();
            run.set_text(translated);
            changed += 1;
        }
    }
    changed
}
