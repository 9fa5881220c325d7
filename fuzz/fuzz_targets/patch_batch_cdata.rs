#![no_main]

use libfuzzer_sys::fuzz_target;
use patch::{PatchBatch, RenderContext};

// Whatever an eval body contains, it must not close the CDATA section it is
// wrapped in: every `]]>` inside must be the first half of a split.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut batch = PatchBatch::new();
    let command = match batch.eval(text) {
        Ok(command) => command,
        Err(_) => {
            assert!(text.trim().is_empty());
            return;
        }
    };
    let Ok(rendered) = command.render_to_string(&RenderContext::new()) else {
        return;
    };
    let inner = rendered
        .strip_prefix("<eval><![CDATA[ ")
        .and_then(|s| s.strip_suffix(" ]]></eval>"))
        .expect("eval is wrapped in one CDATA section");
    for (pos, close) in inner.match_indices("]]>") {
        assert!(
            inner[pos + close.len()..].starts_with("<![CDATA["),
            "unsplit CDATA close at {pos} in {inner:?}"
        );
    }
});
