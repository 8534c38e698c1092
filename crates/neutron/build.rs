fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(false) // We only need the clients
        .compile_protos(&["proto/networkprovider.proto"], &["proto"])?;
    Ok(())
}
