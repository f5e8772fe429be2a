use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::mr::master::to_records;
use crate::mr::{Emitter, MRApp, Mapping, Record};

/// Runs `app` one input at a time on the current task. Same grouping as the
/// concurrent engine, without the workers; the first error ends the run.
pub async fn run(app: &dyn MRApp, inputs: Vec<Record>) -> Result<Mapping, anyhow::Error> {
    let mut intermediate = Mapping::new();
    for input in inputs {
        let (emit, mut rx) = emitter();
        app.map(input, emit).await?;
        drain(&mut rx, &mut intermediate);
    }

    let mut output = Mapping::new();
    for input in to_records(intermediate) {
        let (emit, mut rx) = emitter();
        app.reduce(input, emit).await?;
        drain(&mut rx, &mut output);
    }

    Ok(output)
}

fn emitter() -> (Emitter, mpsc::UnboundedReceiver<Record>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Emitter::new(tx, CancellationToken::new()), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Record>, into: &mut Mapping) {
    while let Ok(record) = rx.try_recv() {
        into.entry(record.key).or_default().extend(record.values);
    }
}
