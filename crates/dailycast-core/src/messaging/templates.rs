//! Canned subscriber-facing texts. Unmapped languages fall back to English.

/// Greeting sent after a new subscription
pub fn welcome(language: &str) -> &'static str {
    match language {
        "es" => "¡Bienvenido a Dailycast! Recibirás tu resumen diario de noticias cada mañana.",
        "fr" => "Bienvenue sur Dailycast ! Vous recevrez votre résumé d'actualités chaque matin.",
        "de" => "Willkommen bei Dailycast! Du erhältst jeden Morgen deine tägliche Nachrichtenübersicht.",
        "pt" => "Bem-vindo ao Dailycast! Você receberá seu resumo diário de notícias todas as manhãs.",
        _ => "Welcome to Dailycast! You'll receive your daily news digest every morning.",
    }
}

/// Confirmation sent after unsubscribing
pub fn goodbye(language: &str) -> &'static str {
    match language {
        "es" => "Has cancelado tu suscripción a Dailycast. Escríbenos cuando quieras para suscribirte de nuevo.",
        "fr" => "Vous êtes désabonné de Dailycast. Écrivez-nous à tout moment pour vous réabonner.",
        "de" => "Du hast Dailycast abbestellt. Schreib uns jederzeit, um dich erneut anzumelden.",
        "pt" => "Sua assinatura do Dailycast foi cancelada. Envie uma mensagem quando quiser para assinar novamente.",
        _ => "You've been unsubscribed from Dailycast. Send us a message anytime to subscribe again.",
    }
}

/// Notice sent when a digest delivery fails
pub fn apology(language: &str) -> &'static str {
    match language {
        "es" => "Lo sentimos, no pudimos entregar tu resumen de noticias de hoy. ¡Lo intentaremos de nuevo mañana!",
        "fr" => "Désolé, nous n'avons pas pu livrer votre résumé d'actualités aujourd'hui. Nous réessaierons demain !",
        "de" => "Entschuldigung, wir konnten deine heutige Nachrichtenübersicht nicht zustellen. Wir versuchen es morgen erneut!",
        "pt" => "Desculpe, não conseguimos entregar seu resumo de notícias hoje. Tentaremos novamente amanhã!",
        _ => "Sorry, we couldn't deliver your daily news summary today. We'll try again tomorrow!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages_are_localized() {
        assert!(welcome("es").contains("Bienvenido"));
        assert!(goodbye("fr").contains("désabonné"));
        assert!(apology("de").contains("Entschuldigung"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(welcome("ja"), welcome("en"));
        assert_eq!(goodbye("xx"), goodbye("en"));
        assert_eq!(apology(""), apology("en"));
    }
}
