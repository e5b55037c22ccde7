fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(user_id), Some(role)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: issue_token <user_id> <admin|teacher|assistant|student>");
    };

    println!("{}", quizdesk::issue_token(&user_id, &role)?);
    Ok(())
}
