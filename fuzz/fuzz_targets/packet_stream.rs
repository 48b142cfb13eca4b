#![no_main]

use libfuzzer_sys::fuzz_target;
use payload::EntityId;
use predict::{decode_input_packet, decode_state_for, LinearMovement, RemoteView};
use std::num::NonZeroUsize;

fuzz_target!(|data: &[u8]| {
    let limits = wire::Limits::for_testing();
    let entity = EntityId::new(1);
    let Some(capacity) = NonZeroUsize::new(64) else {
        return;
    };
    let Ok(mut view) = RemoteView::new(entity, capacity) else {
        return;
    };

    // Length-prefixed chunks, each fed to the transport edge like a datagram.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 80).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let chunk = &data[idx..end];
        idx = end;

        if let Ok(state) = decode_state_for(chunk, &limits, entity) {
            view.receive_state(state);
        }
        if let Ok((_, input)) = decode_input_packet(chunk, &limits) {
            view.receive_input(input);
        }
    }

    // Extrapolation must stay total over whatever the stream left behind.
    let _ = view.display_state(&LinearMovement::default());
});
