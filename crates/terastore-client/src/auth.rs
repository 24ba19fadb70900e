//! Authentication and user administration endpoints.

use terastore_core::{AuthLevel, User};
use tracing::{info, instrument, warn};

use crate::api::{bearer_header, json_body, Auth, Body, TeraStoreClient, FORM};
use crate::error::ClientError;
use crate::http::HttpClient;
use crate::protocol::{
    DeleteUserRequest, LoginForm, RefreshResponse, SignupRequest, TokenResponse, UpdateUserRequest,
};
use crate::routes;
use crate::session::Claims;

impl<T: HttpClient> TeraStoreClient<T> {
    /// Exchange credentials for an access token and store it in the session.
    ///
    /// Calls: POST /auth/login
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<Claims>, ClientError> {
        let form = LoginForm { username, password };
        let body = Body {
            content_type: FORM,
            bytes: form.encode().into_bytes(),
        };
        let response = self
            .execute("POST", routes::AUTH_LOGIN, Some(body), Auth::Anonymous)
            .await?;
        let token: TokenResponse = response.json().map_err(|e| ClientError::Decode {
            path: routes::display_path(routes::AUTH_LOGIN),
            message: e.to_string(),
        })?;

        self.session().set_token(token.access_token);
        info!(username, level = %self.session().auth_level(), "Logged in");
        Ok(self.session().claims())
    }

    /// Obtain a fresh access token and store it in the session.
    ///
    /// Calls: GET /auth/refresh
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<String, ClientError> {
        let response = self.send("GET", routes::AUTH_REFRESH, Vec::new(), None).await?;
        let body: RefreshResponse = response.json().map_err(|e| ClientError::Decode {
            path: routes::display_path(routes::AUTH_REFRESH),
            message: e.to_string(),
        })?;
        self.session().set_token(body.access_token.clone());
        Ok(body.access_token)
    }

    /// Calls: POST /auth/signup
    #[instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = json_body(routes::AUTH_SIGNUP, &SignupRequest { email, password })?;
        self.execute("POST", routes::AUTH_SIGNUP, Some(body), Auth::Anonymous)
            .await?;
        info!(email, "Account created");
        Ok(())
    }

    /// Drop the session token, then tell the backend.
    ///
    /// The token is cleared even when the backend call fails.
    ///
    /// Calls: GET /user/logout
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let token = self.session().token();
        self.session().clear();

        // The captured token goes out directly; `execute` would try a refresh.
        let headers = token.as_deref().map(bearer_header).into_iter().collect();
        let result = self.send("GET", routes::USER_LOGOUT, headers, None).await.map(drop);
        if let Err(e) = &result {
            warn!(error = %e, "Logout request failed; local session cleared");
        }
        result
    }

    /// Calls: GET /user/users
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get_json(routes::USER_LIST).await
    }

    /// Calls: POST /user/update
    #[instrument(skip(self))]
    pub async fn update_user(&self, email: &str, auth_level: AuthLevel) -> Result<(), ClientError> {
        let body = json_body(routes::USER_UPDATE, &UpdateUserRequest { email, auth_level })?;
        self.execute("POST", routes::USER_UPDATE, Some(body), Auth::Bearer)
            .await?;
        Ok(())
    }

    /// Calls: POST /user/delete
    #[instrument(skip(self))]
    pub async fn delete_user(&self, email: &str) -> Result<(), ClientError> {
        let body = json_body(routes::USER_DELETE, &DeleteUserRequest { email })?;
        self.execute("POST", routes::USER_DELETE, Some(body), Auth::Bearer)
            .await?;
        Ok(())
    }
}
