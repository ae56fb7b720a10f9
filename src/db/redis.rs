use redis::Client;

/// Creates a Redis client for conversation sessions
///
/// Opening the client does not connect; connections are made per command
/// through the multiplexed async connection.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}
