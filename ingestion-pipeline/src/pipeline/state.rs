use state_machines::state_machine;

state_machine! {
    name: IngestionRunMachine,
    initial: Pending,
    states: [Pending, BackendReset, SourceVerified, Ingested, GraphBuilt],
    events {
        reset_backend { transition: { from: Pending, to: BackendReset } }
        verify_source { transition: { from: BackendReset, to: SourceVerified } }
        ingest { transition: { from: SourceVerified, to: Ingested } }
        build_graph { transition: { from: Ingested, to: GraphBuilt } }
    }
}

pub fn pending() -> IngestionRunMachine<(), Pending> {
    IngestionRunMachine::new(())
}
